// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::changes::ChangeNotification;
use crate::error::PersistenceError;
use muster_domain::{
    Member, Modality, Operation, OperationKind, OperationStatus, Participation, Window,
};
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Fixed-width UTC timestamp layout. Lexicographic order equals
/// chronological order, which the FIFO and polling queries rely on.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// What a committed participation transition wrote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    /// The inserted or updated participation.
    pub participation_id: Option<i64>,
    pub event_ids: Vec<i64>,
    pub justification_id: Option<i64>,
    /// Published to the change sink after commit.
    pub notifications: Vec<ChangeNotification>,
}

/// The row a roster change produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterRecord {
    Window(Window),
    Operation(Operation),
    Member(Member),
}

/// A member's participation together with the operation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberParticipation {
    pub participation: Participation,
    pub operation_date: Date,
    pub modality: Modality,
    pub kind: OperationKind,
    pub status: OperationStatus,
}

/// Formats an instant as a stored UTC timestamp.
///
/// # Errors
///
/// Returns an error if the instant cannot be formatted.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, PersistenceError> {
    Ok(at.to_offset(UtcOffset::UTC).format(TIMESTAMP_FORMAT)?)
}

/// Parses a stored UTC timestamp.
///
/// # Errors
///
/// Returns an error if the text is not a stored timestamp.
pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    let naive: time::PrimitiveDateTime = time::PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT)?;
    Ok(naive.assume_utc())
}

/// Formats a date as stored.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_date(date: Date) -> Result<String, PersistenceError> {
    Ok(date.format(DATE_FORMAT)?)
}

/// Parses a stored date.
///
/// # Errors
///
/// Returns an error if the text is not a stored date.
pub fn parse_date(text: &str) -> Result<Date, PersistenceError> {
    Ok(Date::parse(text, DATE_FORMAT)?)
}

pub(crate) fn to_db_count(value: u32) -> Result<i32, PersistenceError> {
    i32::try_from(value).map_err(|e| PersistenceError::QueryFailed(e.to_string()))
}

pub(crate) fn from_db_count(value: i32) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

pub(crate) fn to_db_flag(value: bool) -> i32 {
    i32::from(value)
}

pub(crate) const fn from_db_flag(value: i32) -> bool {
    value != 0
}
