// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change detection by timestamp scan.
//!
//! This backs the polling fallback of live subscriptions. It is independent
//! of the change sink: writes that bypass the sink (queue rewrites, other
//! processes sharing the database file) still show up here.

use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::BTreeSet;
use time::OffsetDateTime;

use crate::data_models::format_timestamp;
use crate::diesel_schema::{events, operations, participations};
use crate::error::PersistenceError;

/// Returns which of `operation_ids` saw any write at or after `since`.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `since` - The lower bound of the scan, inclusive
/// * `operation_ids` - The operations to check
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn operations_changed_since(
    conn: &mut SqliteConnection,
    since: OffsetDateTime,
    operation_ids: &[i64],
) -> Result<BTreeSet<i64>, PersistenceError> {
    if operation_ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let since: String = format_timestamp(since)?;

    let mut changed: BTreeSet<i64> = BTreeSet::new();

    let touched: Vec<i64> = operations::table
        .filter(operations::operation_id.eq_any(operation_ids))
        .filter(
            operations::updated_at
                .ge(&since)
                .or(operations::touched_at.ge(&since)),
        )
        .select(operations::operation_id)
        .load(conn)?;
    changed.extend(touched);

    let participation_writes: Vec<i64> = participations::table
        .filter(participations::operation_id.eq_any(operation_ids))
        .filter(participations::updated_at.ge(&since))
        .select(participations::operation_id)
        .distinct()
        .load(conn)?;
    changed.extend(participation_writes);

    let recorded: Vec<i64> = events::table
        .filter(events::operation_id.eq_any(operation_ids))
        .filter(events::occurred_at.ge(&since))
        .select(events::operation_id)
        .distinct()
        .load(conn)?;
    changed.extend(recorded);

    Ok(changed)
}
