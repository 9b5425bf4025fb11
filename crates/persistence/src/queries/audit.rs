// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit timeline reads.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster_audit::{AuditEvent, Justification};

use crate::diesel_schema::{events, justifications};
use crate::error::PersistenceError;
use crate::queries::rows::{EventRow, JustificationRow};

/// Lists the audit events of an operation in the order they were recorded.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_operation_events(
    conn: &mut SqliteConnection,
    operation_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    events::table
        .filter(events::operation_id.eq(operation_id))
        .order(events::event_id.asc())
        .select(EventRow::as_select())
        .load(conn)?
        .into_iter()
        .map(EventRow::into_event)
        .collect()
}

/// Lists the audit events that touched a participation.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_participation_events(
    conn: &mut SqliteConnection,
    participation_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    events::table
        .filter(events::participation_id.eq(participation_id))
        .order(events::event_id.asc())
        .select(EventRow::as_select())
        .load(conn)?
        .into_iter()
        .map(EventRow::into_event)
        .collect()
}

/// Lists the supervisor justifications recorded for a participation.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_justifications(
    conn: &mut SqliteConnection,
    participation_id: i64,
) -> Result<Vec<Justification>, PersistenceError> {
    justifications::table
        .filter(justifications::participation_id.eq(participation_id))
        .order(justifications::justification_id.asc())
        .select(JustificationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(JustificationRow::into_justification)
        .collect()
}
