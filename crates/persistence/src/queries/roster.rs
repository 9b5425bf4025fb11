// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Window, operation and member lookups.

use diesel::prelude::*;
use diesel::SqliteConnection;
use muster::{RosterCommand, RosterContext};
use muster_domain::{Member, Operation, Window};
use time::Date;
use tracing::debug;

use crate::data_models::format_date;
use crate::diesel_schema::{members, operations, windows};
use crate::error::PersistenceError;
use crate::queries::rows::{MemberRow, OperationRow, WindowRow};

/// Retrieves a window by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the window does not exist.
pub fn find_window(
    conn: &mut SqliteConnection,
    window_id: i64,
) -> Result<Option<Window>, PersistenceError> {
    windows::table
        .find(window_id)
        .select(WindowRow::as_select())
        .first(conn)
        .optional()?
        .map(WindowRow::into_window)
        .transpose()
}

/// Retrieves an operation by id, active or not.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the operation does not exist.
pub fn find_operation(
    conn: &mut SqliteConnection,
    operation_id: i64,
) -> Result<Option<Operation>, PersistenceError> {
    debug!(operation_id, "Looking up operation");
    operations::table
        .find(operation_id)
        .select(OperationRow::as_select())
        .first(conn)
        .optional()?
        .map(OperationRow::into_operation)
        .transpose()
}

/// Retrieves a member by id, active or not.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the member does not exist.
pub fn find_member(
    conn: &mut SqliteConnection,
    member_id: i64,
) -> Result<Option<Member>, PersistenceError> {
    members::table
        .find(member_id)
        .select(MemberRow::as_select())
        .first(conn)
        .optional()?
        .map(MemberRow::into_member)
        .transpose()
}

/// Lists all members, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_members(conn: &mut SqliteConnection) -> Result<Vec<Member>, PersistenceError> {
    members::table
        .order(members::member_id.asc())
        .select(MemberRow::as_select())
        .load(conn)?
        .into_iter()
        .map(MemberRow::into_member)
        .collect()
}

/// Lists the active operations of a window, ordered by date.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_window_operations(
    conn: &mut SqliteConnection,
    window_id: i64,
) -> Result<Vec<Operation>, PersistenceError> {
    operations::table
        .filter(operations::window_id.eq(window_id))
        .filter(operations::active.eq(1))
        .order((operations::operation_date.asc(), operations::operation_id.asc()))
        .select(OperationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(OperationRow::into_operation)
        .collect()
}

/// Counts the active operations a window already holds on `date`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_operations_on_day(
    conn: &mut SqliteConnection,
    window_id: i64,
    date: Date,
) -> Result<u32, PersistenceError> {
    let count: i64 = operations::table
        .filter(operations::window_id.eq(window_id))
        .filter(operations::operation_date.eq(format_date(date)?))
        .filter(operations::active.eq(1))
        .count()
        .get_result(conn)?;
    u32::try_from(count).map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

/// Loads the rows a roster command reads.
///
/// Missing rows are left empty; the command decides whether that is an
/// error.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn load_roster_context(
    conn: &mut SqliteConnection,
    command: &RosterCommand,
) -> Result<RosterContext, PersistenceError> {
    match command {
        RosterCommand::CreateWindow { .. } | RosterCommand::RegisterMember { .. } => {
            Ok(RosterContext::default())
        }
        RosterCommand::CreateOperation {
            window_id, date, ..
        } => Ok(RosterContext {
            window: find_window(conn, *window_id)?,
            operations_on_day: count_operations_on_day(conn, *window_id, *date)?,
            ..RosterContext::default()
        }),
        RosterCommand::SetOperationStatus { operation_id, .. }
        | RosterCommand::DeactivateOperation { operation_id } => Ok(RosterContext {
            operation: find_operation(conn, *operation_id)?,
            ..RosterContext::default()
        }),
        RosterCommand::SetMemberActive { member_id, .. } => Ok(RosterContext {
            member: find_member(conn, *member_id)?,
            ..RosterContext::default()
        }),
    }
}
