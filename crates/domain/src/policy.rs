// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::Modality;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Tunable limits consumed by the admission and quota rules.
///
/// Every field has a default, so a partial JSON document only needs to
/// name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Maximum confirmed activities per cycle.
    pub activity_limit: u32,
    /// Maximum per-diem units per calendar month.
    pub per_diem_limit: f64,
    /// Hard threshold; a projected total at or above it is always refused.
    pub per_diem_hard_threshold: f64,
    /// Units earned per operation day.
    pub full_day_unit: f64,
    /// Units earned for the return day closing a sequence.
    pub half_day_unit: f64,
    /// Minimum whole days between today and the operation date.
    pub minimum_lead_days: i64,
    /// The queue is full once it holds `capacity * multiplier` entries.
    pub queue_length_multiplier: u32,
    /// Minimum trimmed length of a supervisor justification.
    pub justification_min_chars: usize,
    /// Day of month on which the activity cycle starts.
    pub cycle_start_day: u8,
    /// Modalities counted towards the activity cycle.
    pub counted_modalities: Vec<Modality>,
    /// IANA zone used to decide what "today" is.
    pub timezone: String,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            activity_limit: 15,
            per_diem_limit: 15.0,
            per_diem_hard_threshold: 15.5,
            full_day_unit: 1.0,
            half_day_unit: 0.5,
            minimum_lead_days: 1,
            queue_length_multiplier: 3,
            justification_min_chars: 10,
            cycle_start_day: 10,
            counted_modalities: vec![Modality::Blitz, Modality::Balanca],
            timezone: String::from("America/Sao_Paulo"),
        }
    }
}

impl SchedulingPolicy {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPolicy` for an out-of-range value and
    /// `DomainError::InvalidTimezone` for an unknown zone.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.activity_limit == 0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "activity_limit must be positive",
            )));
        }
        if self.per_diem_limit.is_nan() || self.per_diem_limit <= 0.0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "per_diem_limit must be positive",
            )));
        }
        if self.per_diem_hard_threshold < self.per_diem_limit {
            return Err(DomainError::InvalidPolicy(String::from(
                "per_diem_hard_threshold must not be below per_diem_limit",
            )));
        }
        if self.full_day_unit.is_nan() || self.full_day_unit <= 0.0 || self.half_day_unit < 0.0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "per-diem unit values must be positive",
            )));
        }
        if self.minimum_lead_days < 0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "minimum_lead_days must not be negative",
            )));
        }
        if self.queue_length_multiplier == 0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "queue_length_multiplier must be positive",
            )));
        }
        // Day 1 would make the cycle a calendar month; 29+ does not exist every month.
        if !(2..=28).contains(&self.cycle_start_day) {
            return Err(DomainError::InvalidPolicy(format!(
                "cycle_start_day must be within 2..=28, got {}",
                self.cycle_start_day
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// Resolves the configured operational timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone name is unknown.
    pub fn tz(&self) -> Result<Tz, DomainError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| DomainError::InvalidTimezone(self.timezone.clone()))
    }

    /// Maximum number of waiting entries for an operation of `capacity`.
    #[must_use]
    pub const fn queue_limit(&self, capacity: u32) -> u32 {
        capacity.saturating_mul(self.queue_length_multiplier)
    }
}
