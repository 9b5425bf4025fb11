// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    assert_rejected_with, confirmed, create_test_context, create_test_operation, member_actor,
    participation, queued, snapshot,
};
use crate::{Command, CoreError, ParticipationWrite, Snapshot, TransitionResult, apply};
use muster_domain::{
    OperationStatus, ParticipationState, PositionChange, RejectionCode, SchedulingPolicy,
};

fn cancel(participation_id: i64, reason: Option<&str>) -> Command {
    Command::Cancel {
        participation_id,
        reason: reason.map(String::from),
    }
}

#[test]
fn test_cancelling_confirmed_entry_promotes_nobody() {
    let policy: SchedulingPolicy = SchedulingPolicy::default();
    let state: Snapshot = snapshot(
        create_test_operation(2, OperationStatus::OpenForDirectJoin),
        None,
        vec![confirmed(1, 1), confirmed(2, 2), queued(3, 3, 1)],
    );

    let result: TransitionResult = apply(
        &state,
        cancel(1, None),
        member_actor(1),
        &create_test_context(&policy),
    )
    .unwrap();

    match result.write {
        Some(ParticipationWrite::Update(update)) => {
            assert_eq!(update.participation_id, 1);
            assert_eq!(update.to, ParticipationState::Cancelled);
            assert!(!update.active);
        }
        other => panic!("expected an update, got {other:?}"),
    }
    // The queued member keeps position 1 and stays queued.
    assert!(result.queue_changes.is_empty());
    assert!(!result.touch);
}

#[test]
fn test_cancelling_queued_entry_shifts_later_entries_up() {
    let policy: SchedulingPolicy = SchedulingPolicy::default();
    let state: Snapshot = snapshot(
        create_test_operation(1, OperationStatus::OpenForDirectJoin),
        None,
        vec![
            confirmed(1, 1),
            queued(2, 2, 1),
            queued(3, 3, 2),
            queued(4, 4, 3),
        ],
    );

    let result: TransitionResult = apply(
        &state,
        cancel(3, Some("Family emergency")),
        member_actor(3),
        &create_test_context(&policy),
    )
    .unwrap();

    assert_eq!(
        result.queue_changes,
        vec![PositionChange {
            participation_id: 4,
            from: Some(3),
            to: 2
        }]
    );
    assert!(result.touch);
    let event = &result.audit_events[0];
    assert_eq!(event.participation_id, Some(3));
    assert_eq!(
        event.change.map(|change| change.from),
        Some(Some(ParticipationState::Queued))
    );
}

#[test]
fn test_cancelling_inactive_entry_is_invalid_transition() {
    let policy: SchedulingPolicy = SchedulingPolicy::default();
    let mut cancelled = participation(1, 1, ParticipationState::Cancelled, None);
    cancelled.active = false;
    let state: Snapshot = snapshot(
        create_test_operation(1, OperationStatus::OpenForDirectJoin),
        None,
        vec![cancelled],
    );

    let result: TransitionResult = apply(
        &state,
        cancel(1, None),
        member_actor(1),
        &create_test_context(&policy),
    )
    .unwrap();

    assert_rejected_with(&result, RejectionCode::InvalidTransition);
}

#[test]
fn test_cancelling_unknown_participation_is_an_error() {
    let policy: SchedulingPolicy = SchedulingPolicy::default();
    let state: Snapshot = snapshot(
        create_test_operation(1, OperationStatus::OpenForDirectJoin),
        None,
        vec![confirmed(1, 1)],
    );

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        cancel(99, None),
        member_actor(1),
        &create_test_context(&policy),
    );

    assert_eq!(result, Err(CoreError::ParticipationNotInSnapshot(99)));
}
