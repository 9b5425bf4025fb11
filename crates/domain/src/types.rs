// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// The field modality an operation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    /// Mobile roadside checkpoint.
    Blitz,
    /// Fixed weighing station.
    Balanca,
}

impl Modality {
    /// Converts this modality to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blitz => "BLITZ",
            Self::Balanca => "BALANCA",
        }
    }
}

impl FromStr for Modality {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BLITZ" => Ok(Self::Blitz),
            "BALANCA" => Ok(Self::Balanca),
            _ => Err(DomainError::InvalidModality(s.to_string())),
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an operation was planned by the supervisors or staffed voluntarily.
///
/// Voluntary operations count towards the activity cycle but never
/// generate per-diem units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    /// A planned operation. Generates per-diem units.
    Planned,
    /// A voluntary operation. Exempt from per-diem accounting.
    Voluntary,
}

impl OperationKind {
    /// Converts this kind to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Voluntary => "VOLUNTARY",
        }
    }

    /// Returns whether participations in operations of this kind accrue per-diem units.
    #[must_use]
    pub const fn accrues_per_diem(&self) -> bool {
        matches!(self, Self::Planned)
    }
}

impl FromStr for OperationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLANNED" => Ok(Self::Planned),
            "VOLUNTARY" => Ok(Self::Voluntary),
            _ => Err(DomainError::InvalidOperationKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The admission status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Members may be confirmed directly while capacity remains.
    OpenForDirectJoin,
    /// Every request waits for a supervisor decision.
    AwaitingReview,
    /// The roster is closed.
    Finalized,
    /// The operation will not take place.
    Cancelled,
}

impl OperationStatus {
    /// Converts this status to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenForDirectJoin => "OPEN_FOR_DIRECT_JOIN",
            Self::AwaitingReview => "AWAITING_REVIEW",
            Self::Finalized => "FINALIZED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns whether new participation requests are accepted at all.
    #[must_use]
    pub const fn accepts_requests(&self) -> bool {
        matches!(self, Self::OpenForDirectJoin | Self::AwaitingReview)
    }

    /// Checks if a supervisor may move an operation from this status to `target`.
    ///
    /// Valid transitions are:
    /// - `OpenForDirectJoin` ↔ `AwaitingReview`
    /// - `OpenForDirectJoin` / `AwaitingReview` → `Finalized` / `Cancelled`
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::OpenForDirectJoin, Self::AwaitingReview)
                | (Self::AwaitingReview, Self::OpenForDirectJoin)
                | (
                    Self::OpenForDirectJoin | Self::AwaitingReview,
                    Self::Finalized | Self::Cancelled
                )
        )
    }
}

impl FromStr for OperationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN_FOR_DIRECT_JOIN" => Ok(Self::OpenForDirectJoin),
            "AWAITING_REVIEW" => Ok(Self::AwaitingReview),
            "FINALIZED" => Ok(Self::Finalized),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidOperationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The role a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    /// An ordinary member who requests participations.
    Member,
    /// A supervisor who manages rosters and overrides the queue.
    Supervisor,
}

impl MemberRole {
    /// Converts this role to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Supervisor => "SUPERVISOR",
        }
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(Self::Member),
            "SUPERVISOR" => Ok(Self::Supervisor),
            _ => Err(DomainError::InvalidMemberRole(s.to_string())),
        }
    }
}

/// The visible state of a participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationState {
    /// Waiting for a supervisor decision on an operation under review.
    Pending,
    /// Waiting in the numbered queue of a full operation.
    Queued,
    /// Holding a regular slot.
    Confirmed,
    /// Holding a slot granted directly by a supervisor.
    SupervisorAdded,
    /// Withdrawn by the member or a supervisor.
    Cancelled,
    /// Declined by a supervisor.
    Rejected,
}

impl ParticipationState {
    /// Converts this state to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Confirmed => "CONFIRMED",
            Self::SupervisorAdded => "SUPERVISOR_ADDED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns whether this state occupies a capacity slot.
    #[must_use]
    pub const fn holds_slot(&self) -> bool {
        matches!(self, Self::Confirmed | Self::SupervisorAdded)
    }

    /// Returns whether this state is waiting for a slot.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self, Self::Pending | Self::Queued)
    }

    /// Returns whether this state is final.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Rejected)
    }

    /// Checks if a participation may move from this state to `target`.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        match target {
            Self::Confirmed | Self::Rejected => self.is_waiting(),
            Self::Cancelled => !self.is_terminal(),
            Self::Pending | Self::Queued | Self::SupervisorAdded => false,
        }
    }
}

impl FromStr for ParticipationState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "QUEUED" => Ok(Self::Queued),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SUPERVISOR_ADDED" => Ok(Self::SupervisorAdded),
            "CANCELLED" => Ok(Self::Cancelled),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidParticipationState(s.to_string())),
        }
    }
}

impl std::fmt::Display for ParticipationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operational window grouping operations over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// The canonical identifier, `None` until persisted.
    window_id: Option<i64>,
    /// First day of the window, inclusive.
    start: Date,
    /// Last day of the window, inclusive.
    end: Date,
    /// Modalities operations in this window may use.
    allowed_modalities: Vec<Modality>,
    /// Maximum number of operations scheduled on the same day.
    daily_operation_limit: u32,
    /// Soft-deactivation flag.
    active: bool,
}

impl Window {
    /// Creates a new, unpersisted window.
    ///
    /// # Arguments
    ///
    /// * `start` - First day of the window
    /// * `end` - Last day of the window
    /// * `allowed_modalities` - Modalities permitted inside the window
    /// * `daily_operation_limit` - Per-day operation cap
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted, no modality is allowed,
    /// or the daily limit is zero.
    pub fn new(
        start: Date,
        end: Date,
        allowed_modalities: Vec<Modality>,
        daily_operation_limit: u32,
    ) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidWindowRange { start, end });
        }
        if allowed_modalities.is_empty() {
            return Err(DomainError::NoModalitiesAllowed);
        }
        if daily_operation_limit == 0 {
            return Err(DomainError::InvalidDailyOperationLimit(
                daily_operation_limit,
            ));
        }

        let mut allowed_modalities: Vec<Modality> = allowed_modalities;
        allowed_modalities.sort_unstable();
        allowed_modalities.dedup();

        Ok(Self {
            window_id: None,
            start,
            end,
            allowed_modalities,
            daily_operation_limit,
            active: true,
        })
    }

    /// Rebuilds a persisted window.
    #[must_use]
    pub const fn with_id(
        window_id: i64,
        start: Date,
        end: Date,
        allowed_modalities: Vec<Modality>,
        daily_operation_limit: u32,
        active: bool,
    ) -> Self {
        Self {
            window_id: Some(window_id),
            start,
            end,
            allowed_modalities,
            daily_operation_limit,
            active,
        }
    }

    #[must_use]
    pub const fn window_id(&self) -> Option<i64> {
        self.window_id
    }

    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    #[must_use]
    pub fn allowed_modalities(&self) -> &[Modality] {
        &self.allowed_modalities
    }

    #[must_use]
    pub const fn daily_operation_limit(&self) -> u32 {
        self.daily_operation_limit
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns whether `date` falls inside the window, bounds included.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns whether operations of `modality` may be scheduled in this window.
    #[must_use]
    pub fn allows(&self, modality: Modality) -> bool {
        self.allowed_modalities.contains(&modality)
    }
}

/// A capacity-limited, dated operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: i64,
    pub window_id: i64,
    pub date: Date,
    pub modality: Modality,
    pub kind: OperationKind,
    pub status: OperationStatus,
    /// Regular slot count. Supervisor overrides may exceed it.
    pub capacity: u32,
    /// Soft-deactivation flag. Operations are never hard-deleted.
    pub active: bool,
}

/// A member of the staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: i64,
    pub name: String,
    pub role: MemberRole,
    pub active: bool,
}

impl Member {
    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        matches!(self.role, MemberRole::Supervisor)
    }
}

/// A member's request for, or assignment to, an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub participation_id: i64,
    pub operation_id: i64,
    pub member_id: i64,
    pub state: ParticipationState,
    /// Derived position among active queued participations, 1-based.
    pub queue_position: Option<u32>,
    /// Immutable request instant. Sole basis for FIFO ordering.
    pub requested_at: OffsetDateTime,
    pub active: bool,
    /// Set when a supervisor placed this participation beyond capacity.
    pub capacity_override: bool,
}

impl Participation {
    /// Returns whether this participation currently occupies a slot.
    #[must_use]
    pub const fn holds_slot(&self) -> bool {
        self.active && self.state.holds_slot()
    }

    /// Returns whether this participation is currently waiting for a slot.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.active && self.state.is_waiting()
    }

    /// Returns whether this participation sits in the numbered queue.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        self.active && matches!(self.state, ParticipationState::Queued)
    }
}
