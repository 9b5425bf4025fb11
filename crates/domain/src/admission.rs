// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Admission rules: eligibility, placement strategy and re-validation.

use crate::calendar::days_until;
use crate::policy::SchedulingPolicy;
use crate::rejection::{Rejection, RejectionCode};
use crate::types::{Member, Operation, OperationStatus, Participation, ParticipationState};
use serde::{Deserialize, Serialize};
use time::Date;

/// Slot usage of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub capacity: u32,
    /// Active participations holding a slot, overrides included.
    pub confirmed: u32,
    pub pending: u32,
    pub queued: u32,
}

impl Occupancy {
    /// Counts the active participations of `operation`.
    ///
    /// Participations belonging to other operations are ignored.
    #[must_use]
    pub fn of(operation: &Operation, participations: &[Participation]) -> Self {
        let mut occupancy: Self = Self {
            capacity: operation.capacity,
            confirmed: 0,
            pending: 0,
            queued: 0,
        };
        for participation in participations
            .iter()
            .filter(|p| p.operation_id == operation.operation_id && p.active)
        {
            match participation.state {
                ParticipationState::Confirmed | ParticipationState::SupervisorAdded => {
                    occupancy.confirmed += 1;
                }
                ParticipationState::Pending => occupancy.pending += 1,
                ParticipationState::Queued => occupancy.queued += 1,
                ParticipationState::Cancelled | ParticipationState::Rejected => {}
            }
        }
        occupancy
    }

    /// Regular slots still free. Never negative, even past an override.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.confirmed)
    }

    #[must_use]
    pub const fn has_vacancy(&self) -> bool {
        self.confirmed < self.capacity
    }

    /// Entries waiting for a slot, pending and queued alike.
    #[must_use]
    pub const fn waiting(&self) -> u32 {
        self.pending + self.queued
    }

    /// Position a newly queued entry would take.
    #[must_use]
    pub const fn estimated_position(&self) -> u32 {
        self.queued + 1
    }
}

/// How a join request will be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// Take a free slot now.
    ConfirmDirect,
    /// Wait for a slot or for a supervisor decision.
    Enqueue,
    /// Refused.
    Rejected(Rejection),
}

impl Strategy {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ConfirmDirect => "CONFIRM_DIRECT",
            Self::Enqueue => "ENQUEUE",
            Self::Rejected(_) => "REJECTED",
        }
    }
}

/// Outcome of the first admission pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub strategy: Strategy,
    pub occupancy: Occupancy,
    pub message: String,
}

/// Runs the terminal eligibility checks for a join request.
///
/// Checks run in a fixed order and the first failure wins: inactive
/// operation, inactive member, past date, duplicate request, lead time.
///
/// # Arguments
///
/// * `operation` - The requested operation
/// * `member` - The requesting member
/// * `participations` - Every participation row of the operation
/// * `today` - The current date in the operational timezone
/// * `policy` - The limits in force
///
/// # Errors
///
/// Returns the `Rejection` of the first failing check.
pub fn check_eligibility(
    operation: &Operation,
    member: &Member,
    participations: &[Participation],
    today: Date,
    policy: &SchedulingPolicy,
) -> Result<(), Rejection> {
    if !operation.active {
        return Err(Rejection::new(
            RejectionCode::OperationInactive,
            format!("Operation {} is inactive", operation.operation_id),
        ));
    }
    if !member.active {
        return Err(Rejection::new(
            RejectionCode::MemberInactive,
            format!("Member {} is inactive", member.member_id),
        ));
    }
    if operation.date < today {
        return Err(Rejection::new(
            RejectionCode::OperationInPast,
            format!("Operation date {} has already passed", operation.date),
        ));
    }
    if participations.iter().any(|p| {
        p.active && p.operation_id == operation.operation_id && p.member_id == member.member_id
    }) {
        return Err(Rejection::new(
            RejectionCode::DuplicateParticipation,
            format!(
                "Member {} already has an active participation in operation {}",
                member.member_id, operation.operation_id
            ),
        ));
    }
    let lead_days: i64 = days_until(today, operation.date);
    if lead_days < policy.minimum_lead_days {
        return Err(Rejection::new(
            RejectionCode::InsufficientLeadTime,
            format!(
                "Requests close {} day(s) before the operation; {lead_days} day(s) left",
                policy.minimum_lead_days
            ),
        ));
    }
    Ok(())
}

/// Picks a placement strategy from the operation status and its occupancy.
#[must_use]
pub fn choose_strategy(operation: &Operation, occupancy: &Occupancy) -> Strategy {
    match operation.status {
        OperationStatus::OpenForDirectJoin if occupancy.has_vacancy() => Strategy::ConfirmDirect,
        OperationStatus::OpenForDirectJoin | OperationStatus::AwaitingReview => Strategy::Enqueue,
        OperationStatus::Finalized | OperationStatus::Cancelled => Strategy::Rejected(
            Rejection::new(
                RejectionCode::InvalidParticipationStatus,
                format!(
                    "Operation {} does not accept requests while {}",
                    operation.operation_id, operation.status
                ),
            ),
        ),
    }
}

/// Re-checks a planned strategy against a freshly read occupancy.
///
/// A direct confirmation whose slot was taken in the meantime is downgraded
/// to the queue. Any queue placement is refused once the waiting list holds
/// `capacity * queue_length_multiplier` entries.
#[must_use]
pub fn revalidate(
    planned: &Strategy,
    operation: &Operation,
    fresh: &Occupancy,
    policy: &SchedulingPolicy,
) -> Strategy {
    let strategy: Strategy = match planned {
        Strategy::ConfirmDirect if fresh.has_vacancy() => return Strategy::ConfirmDirect,
        Strategy::ConfirmDirect | Strategy::Enqueue => Strategy::Enqueue,
        Strategy::Rejected(rejection) => return Strategy::Rejected(rejection.clone()),
    };

    let limit: u32 = policy.queue_limit(operation.capacity);
    if fresh.waiting() >= limit {
        return Strategy::Rejected(Rejection::new(
            RejectionCode::QueueFull,
            format!(
                "Queue for operation {} is full ({} of {limit})",
                operation.operation_id,
                fresh.waiting()
            ),
        ));
    }
    strategy
}

/// The state a queued request takes for this operation.
///
/// Operations under review collect unnumbered pending requests; full open
/// operations keep a numbered queue.
#[must_use]
pub const fn enqueue_state(operation: &Operation) -> ParticipationState {
    match operation.status {
        OperationStatus::AwaitingReview => ParticipationState::Pending,
        _ => ParticipationState::Queued,
    }
}

/// First admission pass: eligibility, then strategy.
///
/// Re-validation and quota projection happen later, against fresh state.
#[must_use]
pub fn evaluate_admission(
    operation: &Operation,
    member: &Member,
    participations: &[Participation],
    today: Date,
    policy: &SchedulingPolicy,
) -> AdmissionDecision {
    let occupancy: Occupancy = Occupancy::of(operation, participations);

    if let Err(rejection) = check_eligibility(operation, member, participations, today, policy) {
        return AdmissionDecision {
            message: rejection.message.clone(),
            strategy: Strategy::Rejected(rejection),
            occupancy,
        };
    }

    let strategy: Strategy = choose_strategy(operation, &occupancy);
    let message: String = describe(&strategy, operation, &occupancy);
    AdmissionDecision {
        strategy,
        occupancy,
        message,
    }
}

/// Human-readable summary of a strategy.
#[must_use]
pub fn describe(strategy: &Strategy, operation: &Operation, occupancy: &Occupancy) -> String {
    match strategy {
        Strategy::ConfirmDirect => format!(
            "Slot available: {} of {} taken",
            occupancy.confirmed, occupancy.capacity
        ),
        Strategy::Enqueue => match enqueue_state(operation) {
            ParticipationState::Pending => String::from("Request awaiting supervisor review"),
            _ => format!(
                "Operation is full; estimated queue position {}",
                occupancy.estimated_position()
            ),
        },
        Strategy::Rejected(rejection) => rejection.message.clone(),
    }
}
