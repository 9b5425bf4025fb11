// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_audit::{AuditEvent, Justification};
use muster_domain::{
    AssignmentRecord, Member, Operation, Participation, ParticipationState, PositionChange,
    QuotaFigures, Rejection, SchedulingPolicy, Strategy,
};
use time::{Date, OffsetDateTime};

/// Everything a participation transition reads, loaded fresh for each call.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The operation being acted on.
    pub operation: Operation,
    /// The member the command is about, when there is one.
    pub subject: Option<Member>,
    /// Every participation row of the operation, inactive rows included.
    pub participations: Vec<Participation>,
    /// The subject's active confirmed assignments on active operations.
    pub subject_history: Vec<AssignmentRecord>,
}

impl Snapshot {
    /// Looks up a participation of this operation.
    #[must_use]
    pub fn participation(&self, participation_id: i64) -> Option<&Participation> {
        self.participations
            .iter()
            .find(|p| p.participation_id == participation_id)
    }

    /// Builds the quota candidate for this operation.
    #[must_use]
    pub const fn candidate(&self) -> AssignmentRecord {
        AssignmentRecord {
            operation_id: self.operation.operation_id,
            date: self.operation.date,
            modality: self.operation.modality,
            kind: self.operation.kind,
        }
    }
}

/// The clock and limits a transition runs against.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub now: OffsetDateTime,
    /// `now` expressed as a date in the operational timezone.
    pub today: Date,
    pub policy: &'a SchedulingPolicy,
}

/// A new participation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipation {
    pub operation_id: i64,
    pub member_id: i64,
    pub state: ParticipationState,
    pub queue_position: Option<u32>,
    pub requested_at: OffsetDateTime,
    pub capacity_override: bool,
}

/// A state change on an existing participation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipationUpdate {
    pub participation_id: i64,
    /// The state the row is expected to hold when the update runs.
    pub from: ParticipationState,
    pub to: ParticipationState,
    pub queue_position: Option<u32>,
    pub active: bool,
}

/// The single participation write a transition performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipationWrite {
    Insert(NewParticipation),
    Update(ParticipationUpdate),
}

/// What an accepted command did.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// The placement strategy, for join requests.
    pub strategy: Option<Strategy>,
    /// The resulting participation state, when a participation was written.
    pub state: Option<ParticipationState>,
    pub queue_position: Option<u32>,
    pub message: String,
    /// Quota figures computed while confirming, if any.
    pub figures: Option<QuotaFigures>,
}

/// The answer to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(Applied),
    Rejected(Rejection),
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// The result of a participation transition: the outcome plus the complete
/// write plan that realises it.
///
/// A rejected outcome carries an empty plan. An applied outcome is persisted
/// atomically: the participation write, queue changes, justification and
/// audit events commit together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub outcome: Outcome,
    pub write: Option<ParticipationWrite>,
    /// Queue position rewrites applied after the participation write.
    pub queue_changes: Vec<PositionChange>,
    /// Written before the participation write.
    pub justification: Option<Justification>,
    pub audit_events: Vec<AuditEvent>,
    /// Whether the operation row must be touched so watchers hear about
    /// queue rewrites.
    pub touch: bool,
}

impl TransitionResult {
    /// A refusal with nothing to write.
    #[must_use]
    pub const fn rejected(rejection: Rejection) -> Self {
        Self {
            outcome: Outcome::Rejected(rejection),
            write: None,
            queue_changes: Vec::new(),
            justification: None,
            audit_events: Vec::new(),
            touch: false,
        }
    }

    /// Whether the plan contains anything to persist.
    #[must_use]
    pub fn has_writes(&self) -> bool {
        self.write.is_some()
            || !self.queue_changes.is_empty()
            || self.justification.is_some()
            || !self.audit_events.is_empty()
    }
}
