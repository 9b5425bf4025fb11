// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Append-only audit writes.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster_audit::{AuditEvent, Justification};
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::format_timestamp;
use crate::diesel_schema::{events, justifications};
use crate::error::PersistenceError;

/// Appends an audit event.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `event` - The event to record
///
/// # Returns
///
/// The assigned event id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let occurred_at: String = format_timestamp(event.occurred_at)?;

    diesel::insert_into(events::table)
        .values((
            events::operation_id.eq(event.operation_id),
            events::member_id.eq(event.member_id),
            events::participation_id.eq(event.participation_id),
            events::event_type.eq(event.event_type.as_str()),
            events::actor_member_id.eq(event.actor.member_id),
            events::actor_role.eq(event.actor.role.as_str()),
            events::cause.eq(event.cause.as_ref().map(|cause| cause.description.as_str())),
            events::from_state.eq(event
                .change
                .as_ref()
                .and_then(|change| change.from)
                .map(|state| state.as_str())),
            events::to_state.eq(event.change.as_ref().map(|change| change.to.as_str())),
            events::details.eq(&event.details),
            events::occurred_at.eq(&occurred_at),
        ))
        .execute(conn)?;

    let event_id: i64 = get_last_insert_rowid(conn)?;
    debug!(event_id, event_type = %event.event_type, "Recorded audit event");
    Ok(event_id)
}

/// Appends a supervisor justification.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `justification` - The justification to record
/// * `participation_id` - The participation it justifies
///
/// # Returns
///
/// The assigned justification id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_justification(
    conn: &mut SqliteConnection,
    justification: &Justification,
    participation_id: i64,
) -> Result<i64, PersistenceError> {
    let recorded_at: String = format_timestamp(justification.recorded_at)?;

    diesel::insert_into(justifications::table)
        .values((
            justifications::participation_id.eq(participation_id),
            justifications::supervisor_id.eq(justification.supervisor_id),
            justifications::justification_text.eq(&justification.text),
            justifications::context.eq(justification.context.as_str()),
            justifications::skipped_participation_id.eq(justification.skipped_participation_id),
            justifications::recorded_at.eq(&recorded_at),
        ))
        .execute(conn)?;

    let justification_id: i64 = get_last_insert_rowid(conn)?;
    debug!(justification_id, participation_id, "Recorded justification");
    Ok(justification_id)
}
