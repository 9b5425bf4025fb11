// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Member quota projection.
//!
//! Totals are always re-derived from the member's confirmed assignments.
//! Nothing here is stored as a counter, so repeating a projection over the
//! same history yields the same figures.

use crate::calendar::{DateSpan, activity_cycle, calendar_month, next_day};
use crate::error::DomainError;
use crate::policy::SchedulingPolicy;
use crate::types::{Modality, OperationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::Date;

/// A confirmed assignment of the member, or the candidate being projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub operation_id: i64,
    pub date: Date,
    pub modality: Modality,
    pub kind: OperationKind,
}

/// A run of consecutive operation days inside one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerDiemSequence {
    pub first_day: Date,
    pub last_day: Date,
    pub days: u32,
    /// Whether the day after `last_day` still falls in the month.
    pub includes_return_day: bool,
    pub units: f64,
}

/// Figures behind a quota decision. Returned whether or not the
/// projection is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaFigures {
    /// The activity cycle the figures were computed for.
    pub cycle: DateSpan,
    /// Confirmed activities in the cycle, candidate included when projecting.
    pub activities: u32,
    pub activity_limit: u32,
    /// The calendar month the per-diem figures were computed for.
    pub month: DateSpan,
    /// Whether the candidate accrues per-diem units at all.
    pub per_diem_applies: bool,
    pub per_diem_units: f64,
    pub per_diem_limit: f64,
    pub per_diem_hard_threshold: f64,
}

/// The limit a projection would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaViolation {
    /// More activities in the cycle than the limit.
    ActivityLimit,
    /// Projected per-diem units reach the hard threshold.
    PerDiemThreshold,
    /// Projected per-diem units exceed the monthly limit.
    PerDiemLimit,
}

/// Result of projecting a candidate assignment onto a member's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaAssessment {
    pub violation: Option<QuotaViolation>,
    pub figures: QuotaFigures,
    pub sequences: Vec<PerDiemSequence>,
}

impl QuotaAssessment {
    /// Returns whether the candidate may be confirmed.
    #[must_use]
    pub const fn allowed(&self) -> bool {
        self.violation.is_none()
    }
}

/// A member's current standing without any candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub figures: QuotaFigures,
    pub sequences: Vec<PerDiemSequence>,
    pub activities_remaining: u32,
    pub per_diem_remaining: f64,
}

/// Projects `candidate` onto the member's confirmed `history`.
///
/// The activity count covers every counted modality and both operation
/// kinds inside the candidate's cycle. Per-diem units are only projected
/// for planned candidates, over planned history in the candidate's month.
/// A history entry for the candidate's own operation is ignored so the
/// candidate is never counted twice.
///
/// # Arguments
///
/// * `policy` - The limits in force
/// * `history` - The member's active confirmed assignments on active operations
/// * `candidate` - The assignment about to be confirmed
///
/// # Errors
///
/// Returns an error if cycle or month boundaries cannot be computed.
pub fn project_quota(
    policy: &SchedulingPolicy,
    history: &[AssignmentRecord],
    candidate: &AssignmentRecord,
) -> Result<QuotaAssessment, DomainError> {
    let others: Vec<AssignmentRecord> = history
        .iter()
        .filter(|record| record.operation_id != candidate.operation_id)
        .copied()
        .collect();

    let cycle: DateSpan = activity_cycle(candidate.date, policy.cycle_start_day)?;
    let month: DateSpan = calendar_month(candidate.date)?;

    let mut activities: u32 = count_activities(policy, &others, cycle);
    if policy.counted_modalities.contains(&candidate.modality) {
        activities = activities.saturating_add(1);
    }

    let per_diem_applies: bool = candidate.kind.accrues_per_diem();
    let mut dates: BTreeSet<Date> = per_diem_dates(&others, month);
    if per_diem_applies {
        dates.insert(candidate.date);
    }
    let sequences: Vec<PerDiemSequence> = per_diem_sequences(policy, &dates, month)?;
    let per_diem_units: f64 = sequences.iter().map(|s| s.units).sum();

    let violation: Option<QuotaViolation> = if activities > policy.activity_limit {
        Some(QuotaViolation::ActivityLimit)
    } else if per_diem_applies && per_diem_units >= policy.per_diem_hard_threshold {
        Some(QuotaViolation::PerDiemThreshold)
    } else if per_diem_applies && per_diem_units > policy.per_diem_limit {
        Some(QuotaViolation::PerDiemLimit)
    } else {
        None
    };

    Ok(QuotaAssessment {
        violation,
        figures: QuotaFigures {
            cycle,
            activities,
            activity_limit: policy.activity_limit,
            month,
            per_diem_applies,
            per_diem_units,
            per_diem_limit: policy.per_diem_limit,
            per_diem_hard_threshold: policy.per_diem_hard_threshold,
        },
        sequences,
    })
}

/// Computes a member's standing for the cycle and month containing `date`.
///
/// # Errors
///
/// Returns an error if cycle or month boundaries cannot be computed.
pub fn quota_status(
    policy: &SchedulingPolicy,
    history: &[AssignmentRecord],
    date: Date,
) -> Result<QuotaStatus, DomainError> {
    let cycle: DateSpan = activity_cycle(date, policy.cycle_start_day)?;
    let month: DateSpan = calendar_month(date)?;

    let activities: u32 = count_activities(policy, history, cycle);
    let dates: BTreeSet<Date> = per_diem_dates(history, month);
    let sequences: Vec<PerDiemSequence> = per_diem_sequences(policy, &dates, month)?;
    let per_diem_units: f64 = sequences.iter().map(|s| s.units).sum();

    Ok(QuotaStatus {
        activities_remaining: policy.activity_limit.saturating_sub(activities),
        per_diem_remaining: (policy.per_diem_limit - per_diem_units).max(0.0),
        figures: QuotaFigures {
            cycle,
            activities,
            activity_limit: policy.activity_limit,
            month,
            per_diem_applies: true,
            per_diem_units,
            per_diem_limit: policy.per_diem_limit,
            per_diem_hard_threshold: policy.per_diem_hard_threshold,
        },
        sequences,
    })
}

/// Splits sorted operation days into consecutive-day sequences.
///
/// A gap of more than one day closes a sequence. Each sequence earns one
/// full unit per day plus one half unit when its return day is still
/// inside `month`.
///
/// # Errors
///
/// Returns an error if a return day cannot be represented.
pub fn per_diem_sequences(
    policy: &SchedulingPolicy,
    dates: &BTreeSet<Date>,
    month: DateSpan,
) -> Result<Vec<PerDiemSequence>, DomainError> {
    let mut runs: Vec<(Date, Date, u32)> = Vec::new();
    for &date in dates {
        let extends: bool = runs
            .last()
            .is_some_and(|(_, last, _)| (date - *last).whole_days() <= 1);
        if let (true, Some(run)) = (extends, runs.last_mut()) {
            run.1 = date;
            run.2 += 1;
        } else {
            runs.push((date, date, 1));
        }
    }

    runs.into_iter()
        .map(|(first_day, last_day, days)| {
            let includes_return_day: bool = month.contains(next_day(last_day)?);
            let mut units: f64 = f64::from(days) * policy.full_day_unit;
            if includes_return_day {
                units += policy.half_day_unit;
            }
            Ok(PerDiemSequence {
                first_day,
                last_day,
                days,
                includes_return_day,
                units,
            })
        })
        .collect()
}

fn count_activities(
    policy: &SchedulingPolicy,
    history: &[AssignmentRecord],
    cycle: DateSpan,
) -> u32 {
    let operations: BTreeSet<i64> = history
        .iter()
        .filter(|record| cycle.contains(record.date))
        .filter(|record| policy.counted_modalities.contains(&record.modality))
        .map(|record| record.operation_id)
        .collect();
    u32::try_from(operations.len()).unwrap_or(u32::MAX)
}

fn per_diem_dates(history: &[AssignmentRecord], month: DateSpan) -> BTreeSet<Date> {
    history
        .iter()
        .filter(|record| record.kind.accrues_per_diem())
        .filter(|record| month.contains(record.date))
        .map(|record| record.date)
        .collect()
}
