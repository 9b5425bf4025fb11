// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Outcome, Snapshot, TransitionContext, TransitionResult};
use muster_audit::Actor;
use muster_domain::{
    AssignmentRecord, Member, MemberRole, Modality, Operation, OperationKind, OperationStatus,
    Participation, ParticipationState, Rejection, RejectionCode, SchedulingPolicy,
};
use time::macros::{date, datetime};
use time::{Date, Duration};

pub const OPERATION_ID: i64 = 1;
pub const SUPERVISOR_ID: i64 = 900;

pub const fn today() -> Date {
    date!(2026 - 03 - 10)
}

pub const fn operation_date() -> Date {
    date!(2026 - 03 - 20)
}

pub fn create_test_context(policy: &SchedulingPolicy) -> TransitionContext<'_> {
    TransitionContext {
        now: datetime!(2026-03-10 12:00 UTC),
        today: today(),
        policy,
    }
}

pub fn create_test_operation(capacity: u32, status: OperationStatus) -> Operation {
    Operation {
        operation_id: OPERATION_ID,
        window_id: 1,
        date: operation_date(),
        modality: Modality::Blitz,
        kind: OperationKind::Planned,
        status,
        capacity,
        active: true,
    }
}

pub fn create_test_member(member_id: i64) -> Member {
    Member {
        member_id,
        name: format!("Member {member_id}"),
        role: MemberRole::Member,
        active: true,
    }
}

pub const fn member_actor(member_id: i64) -> Actor {
    Actor::new(member_id, MemberRole::Member)
}

pub const fn supervisor_actor() -> Actor {
    Actor::new(SUPERVISOR_ID, MemberRole::Supervisor)
}

/// An active participation requested `participation_id` minutes after a base instant.
pub fn participation(
    participation_id: i64,
    member_id: i64,
    state: ParticipationState,
    queue_position: Option<u32>,
) -> Participation {
    Participation {
        participation_id,
        operation_id: OPERATION_ID,
        member_id,
        state,
        queue_position,
        requested_at: datetime!(2026-03-01 08:00 UTC) + Duration::minutes(participation_id),
        active: true,
        capacity_override: false,
    }
}

pub fn confirmed(participation_id: i64, member_id: i64) -> Participation {
    participation(
        participation_id,
        member_id,
        ParticipationState::Confirmed,
        None,
    )
}

pub fn queued(participation_id: i64, member_id: i64, position: u32) -> Participation {
    participation(
        participation_id,
        member_id,
        ParticipationState::Queued,
        Some(position),
    )
}

pub fn pending(participation_id: i64, member_id: i64) -> Participation {
    participation(participation_id, member_id, ParticipationState::Pending, None)
}

pub fn snapshot(
    operation: Operation,
    subject: Option<Member>,
    participations: Vec<Participation>,
) -> Snapshot {
    Snapshot {
        operation,
        subject,
        participations,
        subject_history: Vec::new(),
    }
}

/// Fifteen counted activities inside the March 10 to April 9 cycle.
pub fn full_cycle_history() -> Vec<AssignmentRecord> {
    (0..15)
        .map(|offset| AssignmentRecord {
            operation_id: 200 + offset,
            date: date!(2026 - 03 - 10) + Duration::days(offset),
            modality: Modality::Balanca,
            kind: OperationKind::Voluntary,
        })
        .collect()
}

pub fn expect_rejection(result: &TransitionResult) -> &Rejection {
    match &result.outcome {
        Outcome::Rejected(rejection) => rejection,
        Outcome::Applied(applied) => panic!("expected a rejection, got {applied:?}"),
    }
}

pub fn assert_rejected_with(result: &TransitionResult, code: RejectionCode) {
    assert_eq!(expect_rejection(result).code, code);
    assert!(!result.has_writes());
}
