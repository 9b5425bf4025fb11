// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod admission;
mod calendar;
mod error;
mod policy;
mod queue;
mod quota;
mod rejection;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use admission::{
    AdmissionDecision, Occupancy, Strategy, check_eligibility, choose_strategy, describe,
    enqueue_state, evaluate_admission, revalidate,
};
pub use calendar::{
    DateSpan, activity_cycle, calendar_month, days_until, next_day, operational_today,
    same_month, shift_days,
};
pub use error::DomainError;
pub use policy::SchedulingPolicy;
pub use queue::{
    PositionChange, Standing, compaction_after_removal, direct_slot_candidates,
    earliest_waiting, next_queue_position, positions_are_contiguous, renumber, standing_of,
    waiting_in_order,
};
pub use quota::{
    AssignmentRecord, PerDiemSequence, QuotaAssessment, QuotaFigures, QuotaStatus,
    QuotaViolation, per_diem_sequences, project_quota, quota_status,
};
pub use rejection::{Rejection, RejectionCode};
pub use types::{
    Member, MemberRole, Modality, Operation, OperationKind, OperationStatus, Participation,
    ParticipationState, Window,
};
pub use validation::{
    validate_capacity, validate_justification, validate_member_name,
    validate_operation_placement, validate_status_change,
};
