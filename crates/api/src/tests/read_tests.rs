// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_audit::EventType;
use muster_domain::ParticipationState;
use time::macros::date;

use super::helpers::{ApiFixture, operation_date, setup};
use crate::{
    ApiError, MemberParticipationsResponse, OperationHistoryResponse, OperationRequest,
    OperationSummaryResponse, PositionResponse, QuotaStatusRequest, QuotaStatusResponse,
    get_operation_history, get_operation_summary, get_position, get_quota_status,
    list_member_participations,
};

#[test]
fn test_position_of_member_without_participation() {
    let mut fixture: ApiFixture = setup(1, 1);

    let position: PositionResponse = fixture.position(0);

    assert!(position.participation_id.is_none());
    assert!(position.position.is_none());
    assert_eq!(position.ahead, 0);
}

#[test]
fn test_position_of_confirmed_member_has_no_place_in_line() {
    let mut fixture: ApiFixture = setup(1, 1);
    fixture.joined(0, 1);

    let position: PositionResponse = fixture.position(0);

    assert_eq!(position.state, Some(ParticipationState::Confirmed));
    assert!(position.position.is_none());
}

#[test]
fn test_pending_entries_are_ranked_by_request_time() {
    let mut fixture: ApiFixture = setup(5, 3);
    fixture.set_status("AWAITING_REVIEW");
    fixture.joined(0, 1);
    fixture.joined(1, 2);
    fixture.joined(2, 3);

    let position: PositionResponse = fixture.position(2);

    assert_eq!(position.state, Some(ParticipationState::Pending));
    assert_eq!(position.position, Some(3));
    assert_eq!(position.ahead, 2);
}

#[test]
fn test_position_in_missing_operation_is_not_found() {
    let mut fixture: ApiFixture = setup(1, 1);
    let actor = fixture.members[0];

    let error: ApiError =
        get_position(&mut fixture.persistence, 999, actor.member_id, &actor).unwrap_err();

    assert_eq!(error.code(), Some("OPERACAO_NAO_ENCONTRADA"));
}

#[test]
fn test_quota_status_breaks_per_diem_into_sequences() {
    let mut fixture: ApiFixture = setup(1, 1);
    let days = [
        date!(2026 - 03 - 11),
        date!(2026 - 03 - 12),
        date!(2026 - 03 - 13),
        date!(2026 - 03 - 31),
    ];
    for (minute, day) in days.into_iter().enumerate() {
        let operation_id: i64 = fixture.add_operation(day, "BLITZ", "PLANNED", 1);
        let outcome = fixture.join_operation(operation_id, 0, i64::try_from(minute).unwrap());
        assert!(outcome.success, "join refused: {}", outcome.message);
    }

    let actor = fixture.members[0];
    let status: QuotaStatusResponse = get_quota_status(
        &mut fixture.persistence,
        &fixture.policy,
        &QuotaStatusRequest {
            member_id: actor.member_id,
            date: operation_date(),
        },
        &actor,
    )
    .unwrap();

    assert_eq!(status.figures.activities, 4);
    assert_eq!(status.activities_remaining, 11);
    assert_eq!(status.sequences.len(), 2);
    // Three days plus a return day inside March.
    assert!((status.sequences[0].units - 3.5).abs() < f64::EPSILON);
    assert!(status.sequences[0].includes_return_day);
    // The return day of the last sequence falls in April.
    assert!((status.sequences[1].units - 1.0).abs() < f64::EPSILON);
    assert!(!status.sequences[1].includes_return_day);
    assert!((status.figures.per_diem_units - 4.5).abs() < f64::EPSILON);
    assert!((status.per_diem_remaining - 10.5).abs() < f64::EPSILON);
}

#[test]
fn test_quota_status_of_unknown_member_is_not_found() {
    let mut fixture: ApiFixture = setup(1, 0);

    let error: ApiError = get_quota_status(
        &mut fixture.persistence,
        &fixture.policy,
        &QuotaStatusRequest {
            member_id: 999,
            date: operation_date(),
        },
        &fixture.supervisor,
    )
    .unwrap_err();

    assert_eq!(error.code(), Some("MEMBRO_NAO_ENCONTRADO"));
}

#[test]
fn test_operation_summary_lists_direct_slot_candidates() {
    let mut fixture: ApiFixture = setup(2, 4);
    fixture.joined(0, 1);
    fixture.joined(1, 2);
    let first_waiting: i64 = fixture.joined(2, 3);
    fixture.joined(3, 4);
    assert!(fixture.cancel_own(0, 5).success);

    let operation: OperationRequest = fixture.operation();
    let summary: OperationSummaryResponse =
        get_operation_summary(&mut fixture.persistence, &operation).unwrap();

    assert_eq!(summary.vacancies, 1);
    assert_eq!(summary.waiting, 2);
    assert!(summary.accepting);
    assert_eq!(summary.direct_slot_candidates, vec![first_waiting]);
}

#[test]
fn test_operation_history_is_ordered() {
    let mut fixture: ApiFixture = setup(1, 2);
    fixture.joined(0, 1);
    fixture.joined(1, 2);

    let history: OperationHistoryResponse = get_operation_history(
        &mut fixture.persistence,
        &OperationRequest {
            operation_id: fixture.operation_id,
        },
        &fixture.supervisor,
    )
    .unwrap();

    let types: Vec<EventType> = history
        .events
        .iter()
        .map(|event| event.event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            EventType::OperationCreated,
            EventType::ParticipationConfirmed,
            EventType::ParticipationQueued,
        ]
    );
}

#[test]
fn test_member_participations_exclude_cancelled() {
    let mut fixture: ApiFixture = setup(2, 1);
    let second: i64 = fixture.add_operation(date!(2026 - 03 - 21), "BALANCA", "PLANNED", 2);
    fixture.joined(0, 1);
    fixture.join_operation(second, 0, 2);
    assert!(fixture.cancel_own(0, 3).success);

    let actor = fixture.members[0];
    let listed: MemberParticipationsResponse =
        list_member_participations(&mut fixture.persistence, actor.member_id, &actor).unwrap();

    assert_eq!(listed.participations.len(), 1);
    assert_eq!(listed.participations[0].participation.operation_id, second);
}
