// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::{Arc, Mutex};

use muster::{
    Command, Outcome, RosterChange, RosterCommand, RosterContext, Snapshot, TransitionContext,
    TransitionResult, apply, apply_roster,
};
use muster_audit::Actor;
use muster_domain::{
    MemberRole, Modality, Operation, OperationKind, OperationStatus, SchedulingPolicy, Strategy,
};
use time::macros::{date, datetime};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    ChangeNotification, ChangeSink, ExecutionReport, Persistence, PersistenceError, RosterRecord,
};

pub const SUPERVISOR_ID: i64 = 1;

pub const fn operation_date() -> Date {
    date!(2026 - 03 - 20)
}

pub const fn base_instant() -> OffsetDateTime {
    datetime!(2026-03-10 12:00 UTC)
}

/// The clock `minutes` after the base instant, so request order is stable.
pub fn at(minutes: i64) -> OffsetDateTime {
    base_instant() + Duration::minutes(minutes)
}

pub const fn supervisor() -> Actor {
    Actor::new(SUPERVISOR_ID, MemberRole::Supervisor)
}

pub const fn member(member_id: i64) -> Actor {
    Actor::new(member_id, MemberRole::Member)
}

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub received: Mutex<Vec<ChangeNotification>>,
}

impl ChangeSink for RecordingSink {
    fn publish(&self, change: &ChangeNotification) {
        self.received.lock().unwrap().push(*change);
    }
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ChangeNotification> {
        std::mem::take(&mut *self.received.lock().unwrap())
    }
}

/// A seeded database: one window, one operation, a supervisor and members.
pub struct Fixture {
    pub persistence: Persistence,
    pub window_id: i64,
    pub operation_id: i64,
    pub members: Vec<i64>,
    pub policy: SchedulingPolicy,
}

pub fn roster(
    persistence: &mut Persistence,
    command: RosterCommand,
) -> Result<RosterRecord, PersistenceError> {
    let context: RosterContext = persistence.load_roster_context(&command)?;
    let change: RosterChange =
        apply_roster(&context, command, supervisor(), base_instant()).expect("roster command");
    persistence.execute_roster_change(&change, supervisor(), base_instant())
}

pub fn register_member(persistence: &mut Persistence, name: &str, role: MemberRole) -> i64 {
    match roster(
        persistence,
        RosterCommand::RegisterMember {
            name: name.to_string(),
            role,
        },
    )
    .unwrap()
    {
        RosterRecord::Member(member) => member.member_id,
        other => panic!("expected a member, got {other:?}"),
    }
}

pub fn create_operation(
    persistence: &mut Persistence,
    window_id: i64,
    capacity: u32,
    modality: Modality,
) -> Operation {
    match roster(
        persistence,
        RosterCommand::CreateOperation {
            window_id,
            date: operation_date(),
            modality,
            kind: OperationKind::Planned,
            capacity,
        },
    )
    .unwrap()
    {
        RosterRecord::Operation(operation) => operation,
        other => panic!("expected an operation, got {other:?}"),
    }
}

pub fn set_status(persistence: &mut Persistence, operation_id: i64, status: OperationStatus) {
    roster(
        persistence,
        RosterCommand::SetOperationStatus {
            operation_id,
            status,
        },
    )
    .unwrap();
}

/// Seeds a window, an open operation of `capacity` and `member_count` members.
pub fn seed(capacity: u32, member_count: usize) -> Fixture {
    seed_with(Persistence::new_in_memory().unwrap(), capacity, member_count)
}

pub fn seed_with(mut persistence: Persistence, capacity: u32, member_count: usize) -> Fixture {
    let supervisor_id: i64 =
        register_member(&mut persistence, "Supervisor", MemberRole::Supervisor);
    assert_eq!(supervisor_id, SUPERVISOR_ID);

    let window_id: i64 = match roster(
        &mut persistence,
        RosterCommand::CreateWindow {
            start: date!(2026 - 03 - 01),
            end: date!(2026 - 03 - 31),
            modalities: vec![Modality::Blitz, Modality::Balanca],
            daily_operation_limit: 3,
        },
    )
    .unwrap()
    {
        RosterRecord::Window(window) => window.window_id().unwrap(),
        other => panic!("expected a window, got {other:?}"),
    };

    let operation: Operation =
        create_operation(&mut persistence, window_id, capacity, Modality::Blitz);

    let members: Vec<i64> = (1..=member_count)
        .map(|n| register_member(&mut persistence, &format!("Member {n}"), MemberRole::Member))
        .collect();

    Fixture {
        persistence,
        window_id,
        operation_id: operation.operation_id,
        members,
        policy: SchedulingPolicy::default(),
    }
}

impl Fixture {
    /// Loads a snapshot, applies `command` and executes the plan.
    pub fn run(
        &mut self,
        command: Command,
        subject: Option<i64>,
        actor: Actor,
        now: OffsetDateTime,
    ) -> Result<(TransitionResult, ExecutionReport), PersistenceError> {
        let operation_id: i64 = command.operation_id().unwrap_or(self.operation_id);
        let snapshot: Snapshot = self.persistence.load_snapshot(operation_id, subject)?;
        let context: TransitionContext<'_> = TransitionContext {
            now,
            today: now.date(),
            policy: &self.policy,
        };
        let result: TransitionResult =
            apply(&snapshot, command, actor, &context).expect("transition");
        let report: ExecutionReport =
            self.persistence
                .execute_transition(operation_id, &result, now)?;
        Ok((result, report))
    }

    /// Joins the operation as `member_id` and returns the new participation id.
    pub fn join(&mut self, member_id: i64, minute: i64) -> i64 {
        let (result, report) = self
            .run(
                Command::Join {
                    operation_id: self.operation_id,
                    member_id,
                    planned: Strategy::ConfirmDirect,
                },
                Some(member_id),
                member(member_id),
                at(minute),
            )
            .unwrap();
        assert!(
            matches!(result.outcome, Outcome::Applied(_)),
            "join rejected: {:?}",
            result.outcome
        );
        report.participation_id.unwrap()
    }
}

/// A seeded fixture whose persistence reports to a recording sink.
///
/// Notifications produced while seeding are discarded.
pub fn sink_fixture(capacity: u32, member_count: usize) -> (Fixture, Arc<RecordingSink>) {
    let sink: Arc<RecordingSink> = Arc::new(RecordingSink::default());
    let persistence: Persistence = Persistence::new_in_memory()
        .unwrap()
        .with_change_sink(sink.clone());
    let fixture: Fixture = seed_with(persistence, capacity, member_count);
    sink.take();
    (fixture, sink)
}
