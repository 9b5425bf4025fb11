// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Window, operation and member writes.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster::{NewMember, NewOperation, RosterChange, operation_created_event};
use muster_audit::{Actor, AuditEvent};
use muster_domain::{Member, Operation, Window};
use time::OffsetDateTime;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::changes::{ChangeKind, ChangeNotification, ChangeTable};
use crate::data_models::{RosterRecord, format_date, format_timestamp, to_db_count, to_db_flag};
use crate::diesel_schema::{members, operations, windows};
use crate::error::PersistenceError;
use crate::mutations::audit::insert_event;

/// Persists a validated roster change.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `change` - The planned change
/// * `actor` - The supervisor who issued the command
/// * `now` - The commit instant
///
/// # Returns
///
/// The stored row and the notifications to publish after commit.
///
/// # Errors
///
/// Returns an error if a write fails. Nothing is written in that case.
pub fn execute_roster_change(
    conn: &mut SqliteConnection,
    change: &RosterChange,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<(RosterRecord, Vec<ChangeNotification>), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| match change {
        RosterChange::InsertWindow(window) => {
            let window: Window = insert_window(conn, window)?;
            Ok((RosterRecord::Window(window), Vec::new()))
        }
        RosterChange::InsertOperation(new) => insert_operation(conn, *new, actor, now),
        RosterChange::UpdateOperation {
            operation,
            audit_event,
        } => update_operation(conn, operation, audit_event, now),
        RosterChange::InsertMember(new) => {
            let member: Member = insert_member(conn, new)?;
            Ok((RosterRecord::Member(member), Vec::new()))
        }
        RosterChange::UpdateMember(member) => {
            diesel::update(members::table.find(member.member_id))
                .set(members::active.eq(to_db_flag(member.active)))
                .execute(conn)?;
            info!(member_id = member.member_id, active = member.active, "Member updated");
            Ok((RosterRecord::Member(member.clone()), Vec::new()))
        }
    })
}

fn insert_window(conn: &mut SqliteConnection, window: &Window) -> Result<Window, PersistenceError> {
    let modalities: String = window
        .allowed_modalities()
        .iter()
        .map(|modality| modality.as_str())
        .collect::<Vec<&str>>()
        .join(",");

    diesel::insert_into(windows::table)
        .values((
            windows::start_date.eq(format_date(window.start())?),
            windows::end_date.eq(format_date(window.end())?),
            windows::modalities.eq(&modalities),
            windows::daily_operation_limit.eq(to_db_count(window.daily_operation_limit())?),
            windows::active.eq(to_db_flag(window.is_active())),
        ))
        .execute(conn)?;

    let window_id: i64 = get_last_insert_rowid(conn)?;
    info!(window_id, "Window created");

    Ok(Window::with_id(
        window_id,
        window.start(),
        window.end(),
        window.allowed_modalities().to_vec(),
        window.daily_operation_limit(),
        window.is_active(),
    ))
}

fn insert_operation(
    conn: &mut SqliteConnection,
    new: NewOperation,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<(RosterRecord, Vec<ChangeNotification>), PersistenceError> {
    let stamp: String = format_timestamp(now)?;
    let pending: Operation = new.into_operation(0);

    diesel::insert_into(operations::table)
        .values((
            operations::window_id.eq(pending.window_id),
            operations::operation_date.eq(format_date(pending.date)?),
            operations::modality.eq(pending.modality.as_str()),
            operations::kind.eq(pending.kind.as_str()),
            operations::status.eq(pending.status.as_str()),
            operations::capacity.eq(to_db_count(pending.capacity)?),
            operations::active.eq(1),
            operations::updated_at.eq(&stamp),
            operations::touched_at.eq(&stamp),
        ))
        .execute(conn)?;

    let operation_id: i64 = get_last_insert_rowid(conn)?;
    let operation: Operation = new.into_operation(operation_id);
    let event_id: i64 = insert_event(conn, &operation_created_event(&operation, actor, now))?;

    info!(operation_id, date = %operation.date, "Operation created");

    let notifications: Vec<ChangeNotification> = vec![
        ChangeNotification::new(
            ChangeTable::Operations,
            ChangeKind::Insert,
            operation_id,
            operation_id,
            now,
        ),
        ChangeNotification::new(
            ChangeTable::Events,
            ChangeKind::Insert,
            operation_id,
            event_id,
            now,
        ),
    ];
    Ok((RosterRecord::Operation(operation), notifications))
}

fn update_operation(
    conn: &mut SqliteConnection,
    operation: &Operation,
    audit_event: &AuditEvent,
    now: OffsetDateTime,
) -> Result<(RosterRecord, Vec<ChangeNotification>), PersistenceError> {
    let stamp: String = format_timestamp(now)?;

    diesel::update(operations::table.find(operation.operation_id))
        .set((
            operations::status.eq(operation.status.as_str()),
            operations::active.eq(to_db_flag(operation.active)),
            operations::updated_at.eq(&stamp),
        ))
        .execute(conn)?;

    let event_id: i64 = insert_event(conn, audit_event)?;

    info!(
        operation_id = operation.operation_id,
        status = %operation.status,
        active = operation.active,
        "Operation updated"
    );

    let kind: ChangeKind = if operation.active {
        ChangeKind::Update
    } else {
        ChangeKind::Delete
    };
    let notifications: Vec<ChangeNotification> = vec![
        ChangeNotification::new(
            ChangeTable::Operations,
            kind,
            operation.operation_id,
            operation.operation_id,
            now,
        ),
        ChangeNotification::new(
            ChangeTable::Events,
            ChangeKind::Insert,
            operation.operation_id,
            event_id,
            now,
        ),
    ];
    Ok((RosterRecord::Operation(operation.clone()), notifications))
}

fn insert_member(conn: &mut SqliteConnection, new: &NewMember) -> Result<Member, PersistenceError> {
    diesel::insert_into(members::table)
        .values((
            members::name.eq(&new.name),
            members::role.eq(new.role.as_str()),
            members::active.eq(1),
        ))
        .execute(conn)?;

    let member_id: i64 = get_last_insert_rowid(conn)?;
    info!(member_id, role = new.role.as_str(), "Member registered");

    Ok(Member {
        member_id,
        name: new.name.clone(),
        role: new.role,
        active: true,
    })
}
