// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Participation reads and transition snapshots.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster::Snapshot;
use muster_domain::{
    AssignmentRecord, Member, Modality, Operation, OperationKind, Participation,
    ParticipationState,
};
use std::str::FromStr;
use tracing::debug;

use crate::data_models::{MemberParticipation, parse_date};
use crate::diesel_schema::{operations, participations};
use crate::error::PersistenceError;
use crate::queries::roster::{find_member, find_operation};
use crate::queries::rows::{OperationRow, ParticipationRow};

/// States that hold a slot; the only ones counted towards quotas.
const SLOT_STATES: [&str; 2] = [
    ParticipationState::Confirmed.as_str(),
    ParticipationState::SupervisorAdded.as_str(),
];

/// Retrieves a participation by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the participation does not exist.
pub fn find_participation(
    conn: &mut SqliteConnection,
    participation_id: i64,
) -> Result<Option<Participation>, PersistenceError> {
    participations::table
        .find(participation_id)
        .select(ParticipationRow::as_select())
        .first(conn)
        .optional()?
        .map(ParticipationRow::into_participation)
        .transpose()
}

/// Retrieves the active participation of a member in an operation.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn find_active_participation(
    conn: &mut SqliteConnection,
    operation_id: i64,
    member_id: i64,
) -> Result<Option<Participation>, PersistenceError> {
    participations::table
        .filter(participations::operation_id.eq(operation_id))
        .filter(participations::member_id.eq(member_id))
        .filter(participations::active.eq(1))
        .select(ParticipationRow::as_select())
        .first(conn)
        .optional()?
        .map(ParticipationRow::into_participation)
        .transpose()
}

/// Loads every participation of an operation, inactive rows included,
/// in request order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_operation_participations(
    conn: &mut SqliteConnection,
    operation_id: i64,
) -> Result<Vec<Participation>, PersistenceError> {
    participations::table
        .filter(participations::operation_id.eq(operation_id))
        .order((
            participations::requested_at.asc(),
            participations::participation_id.asc(),
        ))
        .select(ParticipationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(ParticipationRow::into_participation)
        .collect()
}

/// Loads a member's active slot-holding assignments on active operations.
///
/// Quota figures are always re-derived from this scan; no running totals
/// are stored.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_assignment_history(
    conn: &mut SqliteConnection,
    member_id: i64,
) -> Result<Vec<AssignmentRecord>, PersistenceError> {
    let rows: Vec<(i64, String, String, String)> = participations::table
        .inner_join(operations::table)
        .filter(participations::member_id.eq(member_id))
        .filter(participations::active.eq(1))
        .filter(participations::state.eq_any(SLOT_STATES))
        .filter(operations::active.eq(1))
        .order(operations::operation_date.asc())
        .select((
            operations::operation_id,
            operations::operation_date,
            operations::modality,
            operations::kind,
        ))
        .load(conn)?;

    rows.into_iter()
        .map(|(operation_id, date, modality, kind)| {
            Ok(AssignmentRecord {
                operation_id,
                date: parse_date(&date)?,
                modality: Modality::from_str(&modality)?,
                kind: OperationKind::from_str(&kind)?,
            })
        })
        .collect()
}

/// Lists a member's active participations with their operations, by date.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_member_participations(
    conn: &mut SqliteConnection,
    member_id: i64,
) -> Result<Vec<MemberParticipation>, PersistenceError> {
    let rows: Vec<(ParticipationRow, OperationRow)> = participations::table
        .inner_join(operations::table)
        .filter(participations::member_id.eq(member_id))
        .filter(participations::active.eq(1))
        .order((
            operations::operation_date.asc(),
            participations::participation_id.asc(),
        ))
        .select((ParticipationRow::as_select(), OperationRow::as_select()))
        .load(conn)?;

    rows.into_iter()
        .map(|(participation, operation)| {
            let operation: Operation = operation.into_operation()?;
            Ok(MemberParticipation {
                participation: participation.into_participation()?,
                operation_date: operation.date,
                modality: operation.modality,
                kind: operation.kind,
                status: operation.status,
            })
        })
        .collect()
}

/// Loads everything a participation transition reads.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `operation_id` - The operation acted on
/// * `subject_id` - The member the command is about, if any
///
/// # Errors
///
/// Returns an error if the operation or subject does not exist, or a query
/// fails.
pub fn load_snapshot(
    conn: &mut SqliteConnection,
    operation_id: i64,
    subject_id: Option<i64>,
) -> Result<Snapshot, PersistenceError> {
    debug!(operation_id, ?subject_id, "Loading transition snapshot");

    let operation: Operation = find_operation(conn, operation_id)?
        .ok_or(PersistenceError::OperationNotFound(operation_id))?;
    let subject: Option<Member> = match subject_id {
        Some(member_id) => Some(
            find_member(conn, member_id)?.ok_or(PersistenceError::MemberNotFound(member_id))?,
        ),
        None => None,
    };
    let subject_history: Vec<AssignmentRecord> = match subject_id {
        Some(member_id) => list_assignment_history(conn, member_id)?,
        None => Vec::new(),
    };
    let participations: Vec<Participation> = list_operation_participations(conn, operation_id)?;

    Ok(Snapshot {
        operation,
        subject,
        participations,
        subject_history,
    })
}
