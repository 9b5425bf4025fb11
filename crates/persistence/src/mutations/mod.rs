// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side operations.
//!
//! Every public mutation runs inside a single transaction and returns the
//! change notifications it produced. Publishing those notifications is left
//! to the caller, after commit.

pub mod audit;
pub mod roster;
pub mod transition;
