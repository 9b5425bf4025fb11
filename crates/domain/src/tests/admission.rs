// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    confirmed, create_test_member, create_test_operation, create_test_participation, queued,
};
use crate::{
    AdmissionDecision, Member, Occupancy, Operation, OperationStatus, Participation,
    ParticipationState, RejectionCode, SchedulingPolicy, Strategy, enqueue_state,
    evaluate_admission, revalidate,
};
use time::Date;
use time::macros::date;

const TODAY: Date = date!(2026 - 03 - 01);
const OPERATION_DATE: Date = date!(2026 - 03 - 20);

fn rejection_code(decision: &AdmissionDecision) -> Option<RejectionCode> {
    match &decision.strategy {
        Strategy::Rejected(rejection) => Some(rejection.code),
        _ => None,
    }
}

#[test]
fn test_full_open_operation_enqueues_at_position_one() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 2, OperationStatus::OpenForDirectJoin);
    let participations: Vec<Participation> = vec![confirmed(1, 11), confirmed(2, 12)];
    let member: Member = create_test_member(13);

    let decision: AdmissionDecision = evaluate_admission(
        &operation,
        &member,
        &participations,
        TODAY,
        &SchedulingPolicy::default(),
    );

    assert_eq!(decision.strategy, Strategy::Enqueue);
    assert_eq!(decision.occupancy.estimated_position(), 1);
    assert_eq!(enqueue_state(&operation), ParticipationState::Queued);
}

#[test]
fn test_vacancy_after_cancellation_confirms_directly() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 2, OperationStatus::OpenForDirectJoin);
    let mut cancelled: Participation = confirmed(1, 11);
    cancelled.state = ParticipationState::Cancelled;
    cancelled.active = false;
    let participations: Vec<Participation> = vec![cancelled, confirmed(2, 12), queued(3, 13, 1)];
    let member: Member = create_test_member(14);

    let decision: AdmissionDecision = evaluate_admission(
        &operation,
        &member,
        &participations,
        TODAY,
        &SchedulingPolicy::default(),
    );

    assert_eq!(decision.strategy, Strategy::ConfirmDirect);
    assert_eq!(decision.occupancy.confirmed, 1);
    assert_eq!(decision.occupancy.queued, 1);
}

#[test]
fn test_awaiting_review_always_enqueues_as_pending() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 5, OperationStatus::AwaitingReview);
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(decision.strategy, Strategy::Enqueue);
    assert_eq!(enqueue_state(&operation), ParticipationState::Pending);
}

#[test]
fn test_finalized_operation_rejects_with_status_code() {
    let operation: Operation = create_test_operation(OPERATION_DATE, 5, OperationStatus::Finalized);
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(
        rejection_code(&decision),
        Some(RejectionCode::InvalidParticipationStatus)
    );
}

#[test]
fn test_inactive_operation_is_checked_before_inactive_member() {
    let mut operation: Operation =
        create_test_operation(OPERATION_DATE, 5, OperationStatus::OpenForDirectJoin);
    operation.active = false;
    let mut member: Member = create_test_member(11);
    member.active = false;

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(rejection_code(&decision), Some(RejectionCode::OperationInactive));
}

#[test]
fn test_inactive_member_is_rejected() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 5, OperationStatus::OpenForDirectJoin);
    let mut member: Member = create_test_member(11);
    member.active = false;

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(rejection_code(&decision), Some(RejectionCode::MemberInactive));
}

#[test]
fn test_past_operation_is_rejected() {
    let operation: Operation =
        create_test_operation(date!(2026 - 02 - 27), 5, OperationStatus::OpenForDirectJoin);
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(rejection_code(&decision), Some(RejectionCode::OperationInPast));
}

#[test]
fn test_same_day_operation_lacks_lead_time() {
    let operation: Operation = create_test_operation(TODAY, 5, OperationStatus::OpenForDirectJoin);
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision =
        evaluate_admission(&operation, &member, &[], TODAY, &SchedulingPolicy::default());

    assert_eq!(
        rejection_code(&decision),
        Some(RejectionCode::InsufficientLeadTime)
    );
}

#[test]
fn test_duplicate_active_participation_is_rejected() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 5, OperationStatus::OpenForDirectJoin);
    let participations: Vec<Participation> = vec![queued(1, 11, 1)];
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision = evaluate_admission(
        &operation,
        &member,
        &participations,
        TODAY,
        &SchedulingPolicy::default(),
    );

    assert_eq!(
        rejection_code(&decision),
        Some(RejectionCode::DuplicateParticipation)
    );
}

#[test]
fn test_inactive_earlier_participation_does_not_block_rejoin() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 5, OperationStatus::OpenForDirectJoin);
    let mut old: Participation = confirmed(1, 11);
    old.state = ParticipationState::Cancelled;
    old.active = false;
    let member: Member = create_test_member(11);

    let decision: AdmissionDecision = evaluate_admission(
        &operation,
        &member,
        &[old],
        TODAY,
        &SchedulingPolicy::default(),
    );

    assert_eq!(decision.strategy, Strategy::ConfirmDirect);
}

#[test]
fn test_revalidation_downgrades_when_last_slot_was_taken() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 2, OperationStatus::OpenForDirectJoin);
    let fresh: Occupancy = Occupancy::of(&operation, &[confirmed(1, 11), confirmed(2, 12)]);

    let strategy: Strategy = revalidate(
        &Strategy::ConfirmDirect,
        &operation,
        &fresh,
        &SchedulingPolicy::default(),
    );

    assert_eq!(strategy, Strategy::Enqueue);
}

#[test]
fn test_queue_is_full_at_three_times_capacity() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 1, OperationStatus::OpenForDirectJoin);
    let participations: Vec<Participation> = vec![
        confirmed(1, 11),
        queued(2, 12, 1),
        queued(3, 13, 2),
        create_test_participation(4, 14, ParticipationState::Pending, None, 4),
    ];
    let fresh: Occupancy = Occupancy::of(&operation, &participations);

    let strategy: Strategy = revalidate(
        &Strategy::Enqueue,
        &operation,
        &fresh,
        &SchedulingPolicy::default(),
    );

    match strategy {
        Strategy::Rejected(rejection) => assert_eq!(rejection.code.as_str(), "FILA_LOTADA"),
        other => panic!("Expected FILA_LOTADA, got {other:?}"),
    }
}

#[test]
fn test_queue_below_limit_accepts_entry() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 1, OperationStatus::OpenForDirectJoin);
    let participations: Vec<Participation> = vec![confirmed(1, 11), queued(2, 12, 1)];
    let fresh: Occupancy = Occupancy::of(&operation, &participations);

    let strategy: Strategy = revalidate(
        &Strategy::Enqueue,
        &operation,
        &fresh,
        &SchedulingPolicy::default(),
    );

    assert_eq!(strategy, Strategy::Enqueue);
}

#[test]
fn test_supervisor_override_beyond_capacity_leaves_no_vacancy() {
    let operation: Operation =
        create_test_operation(OPERATION_DATE, 1, OperationStatus::OpenForDirectJoin);
    let mut added: Participation = confirmed(2, 12);
    added.state = ParticipationState::SupervisorAdded;
    added.capacity_override = true;
    let occupancy: Occupancy = Occupancy::of(&operation, &[confirmed(1, 11), added]);

    assert_eq!(occupancy.confirmed, 2);
    assert_eq!(occupancy.remaining(), 0);
    assert!(!occupancy.has_vacancy());
}
