// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AssignmentRecord, Member, MemberRole, Modality, Operation, OperationKind, OperationStatus,
    Participation, ParticipationState,
};
use time::macros::datetime;
use time::{Date, Duration, OffsetDateTime};

pub const TEST_OPERATION_ID: i64 = 1;

pub fn create_test_operation(date: Date, capacity: u32, status: OperationStatus) -> Operation {
    Operation {
        operation_id: TEST_OPERATION_ID,
        window_id: 1,
        date,
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

/// Builds an active participation requested `minute` minutes after a fixed base instant.
pub fn create_test_participation(
    participation_id: i64,
    member_id: i64,
    state: ParticipationState,
    queue_position: Option<u32>,
    minute: i64,
) -> Participation {
    let base: OffsetDateTime = datetime!(2026-03-01 08:00 UTC);
    Participation {
        participation_id,
        operation_id: TEST_OPERATION_ID,
        member_id,
        state,
        queue_position,
        requested_at: base + Duration::minutes(minute),
        active: true,
        capacity_override: false,
    }
}

pub fn confirmed(participation_id: i64, member_id: i64) -> Participation {
    create_test_participation(
        participation_id,
        member_id,
        ParticipationState::Confirmed,
        None,
        participation_id,
    )
}

pub fn queued(participation_id: i64, member_id: i64, position: u32) -> Participation {
    create_test_participation(
        participation_id,
        member_id,
        ParticipationState::Queued,
        Some(position),
        participation_id,
    )
}

pub fn assignment(operation_id: i64, date: Date, kind: OperationKind) -> AssignmentRecord {
    AssignmentRecord {
        operation_id,
        date,
        modality: Modality::Blitz,
        kind,
    }
}

/// One assignment per day, consecutive, starting at `first`.
pub fn consecutive_assignments(
    first: Date,
    days: i64,
    kind: OperationKind,
) -> Vec<AssignmentRecord> {
    (0..days)
        .map(|offset| assignment(100 + offset, first + Duration::days(offset), kind))
        .collect()
}
