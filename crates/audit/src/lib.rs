// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

use muster_domain::{MemberRole, ParticipationState};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Represents the member performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting member.
    pub member_id: i64,
    /// The role the member acted under.
    pub role: MemberRole,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `member_id` - The acting member
    /// * `role` - The role the member holds
    #[must_use]
    pub const fn new(member_id: i64, role: MemberRole) -> Self {
        Self { member_id, role }
    }

    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        matches!(self.role, MemberRole::Supervisor)
    }
}

/// Free-text reason supplied with a cancellation or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub description: String,
}

impl Cause {
    #[must_use]
    pub const fn new(description: String) -> Self {
        Self { description }
    }
}

/// A stored audit string that names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// The kind of fact an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A join request took a free slot.
    ParticipationConfirmed,
    /// A join request entered the numbered queue.
    ParticipationQueued,
    /// A join request is waiting for review.
    ParticipationPending,
    /// A supervisor approved a waiting request.
    ParticipationApproved,
    /// A supervisor declined a waiting request.
    ParticipationRejected,
    /// A participation was withdrawn.
    ParticipationCancelled,
    /// A supervisor placed a member directly.
    SupervisorAdded,
    /// The queue was renumbered from request order.
    QueueReorganized,
    OperationCreated,
    OperationStatusChanged,
    OperationDeactivated,
}

impl EventType {
    /// Converts this event type to its stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipationConfirmed => "PARTICIPATION_CONFIRMED",
            Self::ParticipationQueued => "PARTICIPATION_QUEUED",
            Self::ParticipationPending => "PARTICIPATION_PENDING",
            Self::ParticipationApproved => "PARTICIPATION_APPROVED",
            Self::ParticipationRejected => "PARTICIPATION_REJECTED",
            Self::ParticipationCancelled => "PARTICIPATION_CANCELLED",
            Self::SupervisorAdded => "SUPERVISOR_ADDED",
            Self::QueueReorganized => "QUEUE_REORGANIZED",
            Self::OperationCreated => "OPERATION_CREATED",
            Self::OperationStatusChanged => "OPERATION_STATUS_CHANGED",
            Self::OperationDeactivated => "OPERATION_DEACTIVATED",
        }
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PARTICIPATION_CONFIRMED" => Ok(Self::ParticipationConfirmed),
            "PARTICIPATION_QUEUED" => Ok(Self::ParticipationQueued),
            "PARTICIPATION_PENDING" => Ok(Self::ParticipationPending),
            "PARTICIPATION_APPROVED" => Ok(Self::ParticipationApproved),
            "PARTICIPATION_REJECTED" => Ok(Self::ParticipationRejected),
            "PARTICIPATION_CANCELLED" => Ok(Self::ParticipationCancelled),
            "SUPERVISOR_ADDED" => Ok(Self::SupervisorAdded),
            "QUEUE_REORGANIZED" => Ok(Self::QueueReorganized),
            "OPERATION_CREATED" => Ok(Self::OperationCreated),
            "OPERATION_STATUS_CHANGED" => Ok(Self::OperationStatusChanged),
            "OPERATION_DEACTIVATED" => Ok(Self::OperationDeactivated),
            _ => Err(UnknownVariant {
                kind: "event type",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The participation state before and after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// `None` when the participation was created by the transition.
    pub from: Option<ParticipationState>,
    pub to: ParticipationState,
}

/// An immutable, append-only record of something that happened to an
/// operation.
///
/// Every successful state change produces at least one audit event, written
/// in the same transaction as the change itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Assigned by the database; `None` until persisted.
    pub event_id: Option<i64>,
    pub operation_id: i64,
    /// The member the event is about, if any.
    pub member_id: Option<i64>,
    /// The participation the event is about. Filled in at persistence time
    /// when the transition creates the participation.
    pub participation_id: Option<i64>,
    pub event_type: EventType,
    pub actor: Actor,
    pub cause: Option<Cause>,
    pub change: Option<StateChange>,
    /// Human-readable details.
    pub details: String,
    pub occurred_at: OffsetDateTime,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `operation_id` - The operation the event belongs to
    /// * `event_type` - What happened
    /// * `actor` - Who did it
    /// * `details` - Human-readable details
    /// * `occurred_at` - When it happened
    #[must_use]
    pub const fn new(
        operation_id: i64,
        event_type: EventType,
        actor: Actor,
        details: String,
        occurred_at: OffsetDateTime,
    ) -> Self {
        Self {
            event_id: None,
            operation_id,
            member_id: None,
            participation_id: None,
            event_type,
            actor,
            cause: None,
            change: None,
            details,
            occurred_at,
        }
    }

    #[must_use]
    pub const fn with_member(mut self, member_id: i64) -> Self {
        self.member_id = Some(member_id);
        self
    }

    #[must_use]
    pub const fn with_participation(mut self, participation_id: i64) -> Self {
        self.participation_id = Some(participation_id);
        self
    }

    #[must_use]
    pub const fn with_change(
        mut self,
        from: Option<ParticipationState>,
        to: ParticipationState,
    ) -> Self {
        self.change = Some(StateChange { from, to });
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Option<Cause>) -> Self {
        self.cause = cause;
        self
    }
}

/// Why a supervisor had to justify a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JustificationContext {
    /// An approval skipped an earlier waiting request.
    FifoSkip,
    /// A member was placed directly by a supervisor.
    SupervisorAdd,
}

impl JustificationContext {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FifoSkip => "FIFO_SKIP",
            Self::SupervisorAdd => "SUPERVISOR_ADD",
        }
    }
}

impl FromStr for JustificationContext {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFO_SKIP" => Ok(Self::FifoSkip),
            "SUPERVISOR_ADD" => Ok(Self::SupervisorAdd),
            _ => Err(UnknownVariant {
                kind: "justification context",
                value: s.to_string(),
            }),
        }
    }
}

/// An append-only justification attached to a participation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Justification {
    /// Assigned by the database; `None` until persisted.
    pub justification_id: Option<i64>,
    /// `None` while the justified participation is still being created.
    pub participation_id: Option<i64>,
    pub supervisor_id: i64,
    /// Trimmed justification text.
    pub text: String,
    pub context: JustificationContext,
    /// The earliest waiting participation that was passed over, for FIFO skips.
    pub skipped_participation_id: Option<i64>,
    pub recorded_at: OffsetDateTime,
}
