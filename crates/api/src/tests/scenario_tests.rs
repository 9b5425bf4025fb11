// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_domain::{Occupancy, ParticipationState, QuotaFigures};
use time::macros::date;
use time::{Date, Duration};

use super::helpers::{ApiFixture, setup};
use crate::{OutcomeResponse, PositionResponse};

#[test]
fn test_third_join_on_full_operation_is_queued_first() {
    let mut fixture: ApiFixture = setup(2, 3);

    for index in 0..2 {
        let outcome: OutcomeResponse = fixture.join(index, 1 + i64::try_from(index).unwrap());
        assert!(outcome.success);
        assert_eq!(outcome.strategy.as_deref(), Some("CONFIRM_DIRECT"));
        assert_eq!(outcome.state, Some(ParticipationState::Confirmed));
    }

    let third: OutcomeResponse = fixture.join(2, 3);
    assert!(third.success);
    assert_eq!(third.strategy.as_deref(), Some("ENQUEUE"));
    assert_eq!(third.state, Some(ParticipationState::Queued));
    assert_eq!(third.queue_position, Some(1));
    assert_eq!(third.occupancy.unwrap().confirmed, 2);
    assert_eq!(third.occupancy.unwrap().queued, 1);
}

#[test]
fn test_join_reports_occupancy_including_its_own_participation() {
    let mut fixture: ApiFixture = setup(2, 2);

    let first: OutcomeResponse = fixture.join(0, 1);
    assert_eq!(first.strategy.as_deref(), Some("CONFIRM_DIRECT"));
    let occupancy: Occupancy = first.occupancy.unwrap();
    assert_eq!(occupancy.confirmed, 1);
    assert_eq!(occupancy.remaining(), 1);

    let second: OutcomeResponse = fixture.join(1, 2);
    let occupancy: Occupancy = second.occupancy.unwrap();
    assert_eq!(occupancy.confirmed, 2);
    assert_eq!(occupancy.remaining(), 0);
    assert_eq!(occupancy.queued, 0);
}

#[test]
fn test_cancelled_slot_is_not_given_to_the_queue() {
    let mut fixture: ApiFixture = setup(2, 4);
    fixture.joined(0, 1);
    fixture.joined(1, 2);
    fixture.joined(2, 3);

    let cancelled: OutcomeResponse = fixture.cancel_own(0, 4);
    assert!(cancelled.success);
    assert_eq!(cancelled.state, Some(ParticipationState::Cancelled));

    let waiting: PositionResponse = fixture.position(2);
    assert_eq!(waiting.state, Some(ParticipationState::Queued));
    assert_eq!(waiting.position, Some(1));

    let newcomer: OutcomeResponse = fixture.join(3, 5);
    assert!(newcomer.success);
    assert_eq!(newcomer.strategy.as_deref(), Some("CONFIRM_DIRECT"));
    assert_eq!(fixture.position(2).state, Some(ParticipationState::Queued));
}

#[test]
fn test_manual_review_operation_always_enqueues() {
    let mut fixture: ApiFixture = setup(5, 1);
    fixture.set_status("AWAITING_REVIEW");

    let outcome: OutcomeResponse = fixture.join(0, 1);

    assert!(outcome.success);
    assert_eq!(outcome.strategy.as_deref(), Some("ENQUEUE"));
    assert_eq!(outcome.state, Some(ParticipationState::Pending));
    assert_eq!(outcome.queue_position, None);
    assert_eq!(outcome.occupancy.unwrap().confirmed, 0);
}

#[test]
fn test_sixteenth_activity_in_cycle_is_refused_with_figures() {
    let mut fixture: ApiFixture = setup(1, 1);
    let first_day: Date = date!(2026 - 03 - 11);

    let operations: Vec<i64> = (0..16)
        .map(|offset| {
            fixture.add_operation(
                first_day + Duration::days(offset),
                "BALANCA",
                "VOLUNTARY",
                1,
            )
        })
        .collect();

    for (minute, operation_id) in operations.iter().take(15).enumerate() {
        let outcome: OutcomeResponse =
            fixture.join_operation(*operation_id, 0, i64::try_from(minute).unwrap());
        assert!(outcome.success, "join refused: {}", outcome.message);
    }

    let refused: OutcomeResponse = fixture.join_operation(operations[15], 0, 20);
    assert!(!refused.success);
    assert_eq!(refused.error_code.as_deref(), Some("LIMITE_ATIVIDADES"));
    let figures: QuotaFigures = refused.figures.unwrap();
    assert_eq!(figures.activities, 16);
    assert_eq!(figures.activity_limit, 15);
    assert_eq!(figures.cycle.start, date!(2026 - 03 - 10));
    assert_eq!(figures.cycle.end, date!(2026 - 04 - 09));
}

#[test]
fn test_per_diem_hard_threshold_refuses_fifteenth_consecutive_day() {
    let mut fixture: ApiFixture = setup(1, 1);
    let first_day: Date = date!(2026 - 03 - 11);

    let operations: Vec<i64> = (0..15)
        .map(|offset| {
            fixture.add_operation(first_day + Duration::days(offset), "BLITZ", "PLANNED", 1)
        })
        .collect();

    for (minute, operation_id) in operations.iter().take(14).enumerate() {
        let outcome: OutcomeResponse =
            fixture.join_operation(*operation_id, 0, i64::try_from(minute).unwrap());
        assert!(outcome.success, "join refused: {}", outcome.message);
    }

    // 15 days plus the return day inside March.
    let refused: OutcomeResponse = fixture.join_operation(operations[14], 0, 20);
    assert!(!refused.success);
    assert_eq!(refused.error_code.as_deref(), Some("LIMITE_DIARIAS"));
    let figures: QuotaFigures = refused.figures.unwrap();
    assert!((figures.per_diem_units - 15.5).abs() < f64::EPSILON);
    assert_eq!(figures.activities, 15);
}

#[test]
fn test_queue_beyond_multiplier_is_full() {
    let mut fixture: ApiFixture = setup(1, 5);
    fixture.joined(0, 1);
    for index in 1..4 {
        fixture.joined(index, 1 + i64::try_from(index).unwrap());
    }

    let refused: OutcomeResponse = fixture.join(4, 10);

    assert!(!refused.success);
    assert_eq!(refused.error_code.as_deref(), Some("FILA_LOTADA"));
    assert!(fixture.position(4).participation_id.is_none());
}

#[test]
fn test_eligibility_refusals_carry_stable_codes() {
    let mut fixture: ApiFixture = setup(3, 1);
    let past: i64 = fixture.add_operation(date!(2026 - 03 - 05), "BLITZ", "PLANNED", 3);
    let today: i64 = fixture.add_operation(date!(2026 - 03 - 10), "BLITZ", "PLANNED", 3);

    assert_eq!(
        fixture.join_operation(past, 0, 1).error_code.as_deref(),
        Some("OPERACAO_PASSADO")
    );
    assert_eq!(
        fixture.join_operation(today, 0, 1).error_code.as_deref(),
        Some("ANTECEDENCIA_INSUFICIENTE")
    );

    fixture.joined(0, 2);
    assert_eq!(
        fixture.join(0, 3).error_code.as_deref(),
        Some("PARTICIPACAO_DUPLICADA")
    );
}

#[test]
fn test_finalized_operation_refuses_requests() {
    let mut fixture: ApiFixture = setup(3, 1);
    fixture.set_status("FINALIZED");

    let refused: OutcomeResponse = fixture.join(0, 1);

    assert!(!refused.success);
    assert_eq!(
        refused.error_code.as_deref(),
        Some("STATUS_INVALIDO_PARTICIPACAO")
    );
}

#[test]
fn test_cancelling_queued_entry_compacts_positions() {
    let mut fixture: ApiFixture = setup(1, 4);
    fixture.joined(0, 1);
    fixture.joined(1, 2);
    fixture.joined(2, 3);
    fixture.joined(3, 4);

    assert!(fixture.cancel_own(1, 5).success);

    assert_eq!(fixture.position(2).position, Some(1));
    assert_eq!(fixture.position(3).position, Some(2));
    assert_eq!(fixture.position(3).ahead, 1);
}

#[test]
fn test_cancel_without_active_participation_is_not_found() {
    let mut fixture: ApiFixture = setup(1, 1);
    let actor = fixture.members[0];

    let error = crate::cancel(
        &mut fixture.persistence,
        &fixture.policy,
        &crate::CancelRequest {
            target: crate::CancelTarget::Member {
                operation_id: fixture.operation_id,
                member_id: actor.member_id,
            },
            reason: None,
        },
        &actor,
        super::helpers::at(1),
    )
    .unwrap_err();

    assert_eq!(error.code(), Some("PARTICIPACAO_NAO_ENCONTRADA"));
}
