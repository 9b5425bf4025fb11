// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side queries.
//!
//! All queries use Diesel DSL and return domain values; stored text is
//! parsed back into domain enums on the way out.

pub mod audit;
pub mod roster;
pub(crate) mod rows;
pub mod snapshot;
pub mod watch;
