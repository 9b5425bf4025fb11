// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_domain::SchedulingPolicy;
use muster_persistence::Persistence;
use time::macros::{date, datetime};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    AuthenticatedActor, AuthenticationService, CancelRequest, CancelTarget,
    CreateOperationRequest, CreateWindowRequest, JoinRequest, MemberInfo, OperationInfo,
    OperationRequest, OutcomeResponse, PositionResponse, RegisterMemberRequest,
    SetOperationStatusRequest, WindowInfo, bootstrap_supervisor, cancel, create_operation,
    create_window, get_position, join, register_member, set_operation_status,
};

pub fn operation_date() -> Date {
    date!(2026 - 03 - 20)
}

/// 09:00 on 2026-03-10 in the operational timezone.
pub fn now() -> OffsetDateTime {
    datetime!(2026-03-10 12:00 UTC)
}

/// The clock `minutes` after `now()`, so request order is stable.
pub fn at(minutes: i64) -> OffsetDateTime {
    now() + Duration::minutes(minutes)
}

/// A roster with one window, one open Blitz operation and some members,
/// all created through the API.
pub struct ApiFixture {
    pub persistence: Persistence,
    pub policy: SchedulingPolicy,
    pub supervisor: AuthenticatedActor,
    pub window_id: i64,
    pub operation_id: i64,
    pub members: Vec<AuthenticatedActor>,
}

pub fn setup(capacity: u32, member_count: usize) -> ApiFixture {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let boss: MemberInfo = bootstrap_supervisor(&mut persistence, "Supervisor", now()).unwrap();
    let supervisor: AuthenticatedActor =
        AuthenticationService::authenticate(&mut persistence, boss.member_id).unwrap();

    let window: WindowInfo = create_window(
        &mut persistence,
        &CreateWindowRequest {
            start: date!(2026 - 03 - 01),
            end: date!(2026 - 03 - 31),
            modalities: vec![String::from("BLITZ"), String::from("BALANCA")],
            daily_operation_limit: 3,
        },
        &supervisor,
        now(),
    )
    .unwrap();
    let window_id: i64 = window.window_id.unwrap();

    let mut members: Vec<AuthenticatedActor> = Vec::new();
    for n in 1..=member_count {
        let info: MemberInfo = register_member(
            &mut persistence,
            &RegisterMemberRequest {
                name: format!("Member {n}"),
                role: String::from("MEMBER"),
            },
            &supervisor,
            now(),
        )
        .unwrap();
        members.push(
            AuthenticationService::authenticate(&mut persistence, info.member_id).unwrap(),
        );
    }

    let mut fixture: ApiFixture = ApiFixture {
        persistence,
        policy: SchedulingPolicy::default(),
        supervisor,
        window_id,
        operation_id: 0,
        members,
    };
    fixture.operation_id = fixture.add_operation(operation_date(), "BLITZ", "PLANNED", capacity);
    fixture
}

impl ApiFixture {
    pub fn member_id(&self, index: usize) -> i64 {
        self.members[index].member_id
    }

    pub fn add_operation(&mut self, date: Date, modality: &str, kind: &str, capacity: u32) -> i64 {
        let info: OperationInfo = create_operation(
            &mut self.persistence,
            &CreateOperationRequest {
                window_id: self.window_id,
                date,
                modality: modality.to_string(),
                kind: kind.to_string(),
                capacity,
            },
            &self.supervisor,
            now(),
        )
        .unwrap();
        info.operation_id
    }

    pub fn set_status(&mut self, status: &str) {
        set_operation_status(
            &mut self.persistence,
            &SetOperationStatusRequest {
                operation_id: self.operation_id,
                status: status.to_string(),
            },
            &self.supervisor,
            now(),
        )
        .unwrap();
    }

    /// Joins `operation_id` as member `index`.
    pub fn join_operation(
        &mut self,
        operation_id: i64,
        index: usize,
        minute: i64,
    ) -> OutcomeResponse {
        let actor: AuthenticatedActor = self.members[index];
        join(
            &mut self.persistence,
            &self.policy,
            &JoinRequest {
                operation_id,
                member_id: actor.member_id,
            },
            &actor,
            at(minute),
        )
        .unwrap()
    }

    /// Joins the fixture operation as member `index`.
    pub fn join(&mut self, index: usize, minute: i64) -> OutcomeResponse {
        self.join_operation(self.operation_id, index, minute)
    }

    /// Joins and returns the new participation id, asserting success.
    pub fn joined(&mut self, index: usize, minute: i64) -> i64 {
        let outcome: OutcomeResponse = self.join(index, minute);
        assert!(outcome.success, "join refused: {}", outcome.message);
        outcome.participation_id.unwrap()
    }

    pub fn cancel_own(&mut self, index: usize, minute: i64) -> OutcomeResponse {
        let actor: AuthenticatedActor = self.members[index];
        cancel(
            &mut self.persistence,
            &self.policy,
            &CancelRequest {
                target: CancelTarget::Member {
                    operation_id: self.operation_id,
                    member_id: actor.member_id,
                },
                reason: None,
            },
            &actor,
            at(minute),
        )
        .unwrap()
    }

    pub fn position(&mut self, index: usize) -> PositionResponse {
        let actor: AuthenticatedActor = self.members[index];
        get_position(
            &mut self.persistence,
            self.operation_id,
            actor.member_id,
            &actor,
        )
        .unwrap()
    }

    pub fn operation(&self) -> OperationRequest {
        OperationRequest {
            operation_id: self.operation_id,
        }
    }
}
