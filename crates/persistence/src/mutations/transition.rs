// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Atomic execution of participation transition plans.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster::{NewParticipation, ParticipationUpdate, ParticipationWrite, TransitionResult};
use muster_audit::{AuditEvent, Justification};
use muster_domain::{ParticipationState, PositionChange};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::changes::{ChangeKind, ChangeNotification, ChangeTable};
use crate::data_models::{ExecutionReport, format_timestamp, to_db_count, to_db_flag};
use crate::diesel_schema::{operations, participations};
use crate::error::PersistenceError;
use crate::mutations::audit::{insert_event, insert_justification};

/// Persists the write plan of an applied transition.
///
/// The participation write, the queue rewrites, the justification, the
/// operation touch and the audit events commit together. Any failure rolls
/// the whole plan back, including a capacity or uniqueness trigger firing
/// or the target row having moved since the snapshot was read.
///
/// Queue rewrites do not produce per-row notifications; the operation touch
/// stands in for them.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `operation_id` - The operation the plan was computed for
/// * `result` - The transition result
/// * `now` - The commit instant, stamped on touched rows
///
/// # Errors
///
/// Returns an error if any write fails. Races surface as errors for which
/// [`PersistenceError::is_conflict`] holds.
pub fn execute_transition(
    conn: &mut SqliteConnection,
    operation_id: i64,
    result: &TransitionResult,
    now: OffsetDateTime,
) -> Result<ExecutionReport, PersistenceError> {
    if !result.has_writes() {
        return Ok(ExecutionReport::default());
    }

    let stamp: String = format_timestamp(now)?;

    conn.transaction::<ExecutionReport, PersistenceError, _>(|conn| {
        let mut report: ExecutionReport = ExecutionReport::default();

        // A justification naming an existing row goes in ahead of the write
        // it justifies.
        let attached: Option<(&Justification, i64)> =
            result.justification.as_ref().and_then(|justification| {
                justification
                    .participation_id
                    .map(|participation_id| (justification, participation_id))
            });
        if let Some((justification, participation_id)) = attached {
            let justification_id: i64 =
                insert_justification(conn, justification, participation_id)?;
            report.justification_id = Some(justification_id);
            report.notifications.push(ChangeNotification::new(
                ChangeTable::Justifications,
                ChangeKind::Insert,
                operation_id,
                justification_id,
                now,
            ));
        }

        match &result.write {
            Some(ParticipationWrite::Insert(new)) => {
                let participation_id: i64 = insert_participation(conn, new, &stamp)?;
                report.participation_id = Some(participation_id);
                report.notifications.push(ChangeNotification::new(
                    ChangeTable::Participations,
                    ChangeKind::Insert,
                    operation_id,
                    participation_id,
                    now,
                ));
            }
            Some(ParticipationWrite::Update(update)) => {
                update_participation(conn, update, &stamp)?;
                report.participation_id = Some(update.participation_id);
                let kind: ChangeKind = if update.active {
                    ChangeKind::Update
                } else {
                    ChangeKind::Delete
                };
                report.notifications.push(ChangeNotification::new(
                    ChangeTable::Participations,
                    kind,
                    operation_id,
                    update.participation_id,
                    now,
                ));
            }
            None => {}
        }

        // Otherwise it attaches to the row just written.
        let detached: Option<&Justification> = result
            .justification
            .as_ref()
            .filter(|justification| justification.participation_id.is_none());
        if let Some(justification) = detached {
            let participation_id: i64 = report.participation_id.ok_or_else(|| {
                PersistenceError::QueryFailed(String::from(
                    "Justification has no participation to attach to",
                ))
            })?;
            let justification_id: i64 =
                insert_justification(conn, justification, participation_id)?;
            report.justification_id = Some(justification_id);
            report.notifications.push(ChangeNotification::new(
                ChangeTable::Justifications,
                ChangeKind::Insert,
                operation_id,
                justification_id,
                now,
            ));
        }

        for change in &result.queue_changes {
            apply_position_change(conn, operation_id, change)?;
        }

        if result.touch {
            touch_operation(conn, operation_id, &stamp)?;
            report.notifications.push(ChangeNotification::new(
                ChangeTable::Operations,
                ChangeKind::Update,
                operation_id,
                operation_id,
                now,
            ));
        }

        for event in &result.audit_events {
            let mut event: AuditEvent = event.clone();
            if event.participation_id.is_none() {
                event.participation_id = report.participation_id;
            }
            let event_id: i64 = insert_event(conn, &event)?;
            report.event_ids.push(event_id);
            report.notifications.push(ChangeNotification::new(
                ChangeTable::Events,
                ChangeKind::Insert,
                operation_id,
                event_id,
                now,
            ));
        }

        info!(
            operation_id,
            participation_id = ?report.participation_id,
            queue_changes = result.queue_changes.len(),
            events = report.event_ids.len(),
            "Transition committed"
        );
        Ok(report)
    })
}

fn insert_participation(
    conn: &mut SqliteConnection,
    new: &NewParticipation,
    stamp: &str,
) -> Result<i64, PersistenceError> {
    let requested_at: String = format_timestamp(new.requested_at)?;
    let queue_position: Option<i32> = new.queue_position.map(to_db_count).transpose()?;

    diesel::insert_into(participations::table)
        .values((
            participations::operation_id.eq(new.operation_id),
            participations::member_id.eq(new.member_id),
            participations::state.eq(new.state.as_str()),
            participations::queue_position.eq(queue_position),
            participations::requested_at.eq(&requested_at),
            participations::active.eq(1),
            participations::capacity_override.eq(to_db_flag(new.capacity_override)),
            participations::updated_at.eq(stamp),
        ))
        .execute(conn)?;

    let participation_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        participation_id,
        member_id = new.member_id,
        state = %new.state,
        "Inserted participation"
    );
    Ok(participation_id)
}

/// Applies a state change guarded by the state the plan was computed from.
fn update_participation(
    conn: &mut SqliteConnection,
    update: &ParticipationUpdate,
    stamp: &str,
) -> Result<(), PersistenceError> {
    let queue_position: Option<i32> = update.queue_position.map(to_db_count).transpose()?;

    let updated: usize = diesel::update(participations::table)
        .filter(participations::participation_id.eq(update.participation_id))
        .filter(participations::state.eq(update.from.as_str()))
        .filter(participations::active.eq(1))
        .set((
            participations::state.eq(update.to.as_str()),
            participations::queue_position.eq(queue_position),
            participations::active.eq(to_db_flag(update.active)),
            participations::updated_at.eq(stamp),
        ))
        .execute(conn)?;

    if updated == 0 {
        warn!(
            participation_id = update.participation_id,
            expected = %update.from,
            "Participation moved before the update ran"
        );
        return Err(PersistenceError::ConcurrentModification(
            update.participation_id,
        ));
    }
    Ok(())
}

/// Rewrites one queue position without stamping the row.
fn apply_position_change(
    conn: &mut SqliteConnection,
    operation_id: i64,
    change: &PositionChange,
) -> Result<(), PersistenceError> {
    let to: i32 = to_db_count(change.to)?;
    let from: Option<i32> = change.from.map(to_db_count).transpose()?;

    let target = participations::table
        .filter(participations::participation_id.eq(change.participation_id))
        .filter(participations::operation_id.eq(operation_id))
        .filter(participations::state.eq(ParticipationState::Queued.as_str()))
        .filter(participations::active.eq(1));

    let updated: usize = match from {
        Some(from) => diesel::update(target.filter(participations::queue_position.eq(from)))
            .set(participations::queue_position.eq(to))
            .execute(conn)?,
        None => diesel::update(target.filter(participations::queue_position.is_null()))
            .set(participations::queue_position.eq(to))
            .execute(conn)?,
    };

    if updated == 0 {
        return Err(PersistenceError::ConcurrentModification(
            change.participation_id,
        ));
    }
    Ok(())
}

fn touch_operation(
    conn: &mut SqliteConnection,
    operation_id: i64,
    stamp: &str,
) -> Result<(), PersistenceError> {
    diesel::update(operations::table.find(operation_id))
        .set(operations::touched_at.eq(stamp))
        .execute(conn)?;
    Ok(())
}
