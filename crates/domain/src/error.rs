// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{Modality, OperationStatus};
use time::Date;

/// Errors that can occur during domain validation.
///
/// These describe malformed input or structural rule violations. Business
/// rejections of a participation request are not errors; see `Rejection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A window ends before it starts.
    InvalidWindowRange {
        /// The requested first day.
        start: Date,
        /// The requested last day.
        end: Date,
    },
    /// A window must allow at least one modality.
    NoModalitiesAllowed,
    /// The daily operation limit must be positive.
    InvalidDailyOperationLimit(u32),
    /// Operation capacity must be positive.
    InvalidCapacity(u32),
    /// The operation's modality is not allowed by its window.
    ModalityNotAllowed(Modality),
    /// The operation date falls outside its window.
    DateOutsideWindow {
        /// The requested operation date.
        date: Date,
        /// First day of the window.
        start: Date,
        /// Last day of the window.
        end: Date,
    },
    /// The window already holds its maximum number of operations on this day.
    DailyOperationLimitReached {
        /// The saturated day.
        date: Date,
        /// The configured daily limit.
        limit: u32,
    },
    /// The window is deactivated.
    WindowInactive(i64),
    /// The requested status change is not permitted.
    InvalidStatusTransition {
        /// Current status.
        from: OperationStatus,
        /// Requested status.
        to: OperationStatus,
    },
    /// A justification is shorter than the configured minimum.
    JustificationTooShort {
        /// Trimmed character count supplied.
        length: usize,
        /// Required minimum.
        minimum: usize,
    },
    /// Member name is empty or invalid.
    InvalidMemberName(String),
    /// Unknown modality string.
    InvalidModality(String),
    /// Unknown operation kind string.
    InvalidOperationKind(String),
    /// Unknown operation status string.
    InvalidOperationStatus(String),
    /// Unknown participation state string.
    InvalidParticipationState(String),
    /// Unknown member role string.
    InvalidMemberRole(String),
    /// The configured timezone is not a known IANA zone.
    InvalidTimezone(String),
    /// A scheduling policy value is out of range.
    InvalidPolicy(String),
    /// Date arithmetic overflow.
    DateArithmeticOverflow,
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWindowRange { start, end } => {
                write!(f, "Window end {end} is before its start {start}")
            }
            Self::NoModalitiesAllowed => write!(f, "A window must allow at least one modality"),
            Self::InvalidDailyOperationLimit(limit) => {
                write!(f, "Daily operation limit must be positive, got {limit}")
            }
            Self::InvalidCapacity(capacity) => {
                write!(f, "Operation capacity must be positive, got {capacity}")
            }
            Self::ModalityNotAllowed(modality) => {
                write!(f, "Modality {modality} is not allowed in this window")
            }
            Self::DateOutsideWindow { date, start, end } => {
                write!(f, "Date {date} is outside the window {start}..={end}")
            }
            Self::DailyOperationLimitReached { date, limit } => {
                write!(f, "Window already has {limit} operation(s) on {date}")
            }
            Self::WindowInactive(window_id) => write!(f, "Window {window_id} is inactive"),
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Cannot change operation status from {from} to {to}")
            }
            Self::JustificationTooShort { length, minimum } => {
                write!(
                    f,
                    "Justification has {length} character(s), at least {minimum} required"
                )
            }
            Self::InvalidMemberName(msg) => write!(f, "Invalid member name: {msg}"),
            Self::InvalidModality(s) => write!(f, "Invalid modality: {s}"),
            Self::InvalidOperationKind(s) => write!(f, "Invalid operation kind: {s}"),
            Self::InvalidOperationStatus(s) => write!(f, "Invalid operation status: {s}"),
            Self::InvalidParticipationState(s) => write!(f, "Invalid participation state: {s}"),
            Self::InvalidMemberRole(s) => write!(f, "Invalid member role: {s}"),
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::InvalidPolicy(msg) => write!(f, "Invalid scheduling policy: {msg}"),
            Self::DateArithmeticOverflow => write!(f, "Date arithmetic overflow"),
        }
    }
}

impl std::error::Error for DomainError {}
