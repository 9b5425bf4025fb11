// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{Modality, OperationStatus, Window};
use time::Date;

/// Validates a member name.
///
/// # Errors
///
/// Returns an error if the name is blank.
pub fn validate_member_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidMemberName(String::from(
            "Name cannot be empty",
        )));
    }
    Ok(())
}

/// Validates an operation capacity.
///
/// # Errors
///
/// Returns an error if the capacity is zero.
pub const fn validate_capacity(capacity: u32) -> Result<(), DomainError> {
    if capacity == 0 {
        return Err(DomainError::InvalidCapacity(capacity));
    }
    Ok(())
}

/// Validates that an operation fits into its window.
///
/// # Arguments
///
/// * `window` - The enclosing window
/// * `date` - The requested operation date
/// * `modality` - The requested modality
/// * `operations_on_day` - Active operations the window already holds on `date`
///
/// # Errors
///
/// Returns an error if the window is inactive, the date is outside it, the
/// modality is not allowed, or the day is already saturated.
pub fn validate_operation_placement(
    window: &Window,
    date: Date,
    modality: Modality,
    operations_on_day: u32,
) -> Result<(), DomainError> {
    if !window.is_active() {
        return Err(DomainError::WindowInactive(window.window_id().unwrap_or(0)));
    }
    if !window.contains(date) {
        return Err(DomainError::DateOutsideWindow {
            date,
            start: window.start(),
            end: window.end(),
        });
    }
    if !window.allows(modality) {
        return Err(DomainError::ModalityNotAllowed(modality));
    }
    if operations_on_day >= window.daily_operation_limit() {
        return Err(DomainError::DailyOperationLimitReached {
            date,
            limit: window.daily_operation_limit(),
        });
    }
    Ok(())
}

/// Validates an operation status change.
///
/// # Errors
///
/// Returns an error if the transition is not permitted.
pub const fn validate_status_change(
    from: OperationStatus,
    to: OperationStatus,
) -> Result<(), DomainError> {
    if !from.can_transition_to(to) {
        return Err(DomainError::InvalidStatusTransition { from, to });
    }
    Ok(())
}

/// Validates a supervisor justification and returns it trimmed.
///
/// Length is measured in characters after trimming surrounding whitespace.
///
/// # Errors
///
/// Returns an error if fewer than `minimum` characters remain.
pub fn validate_justification(text: &str, minimum: usize) -> Result<String, DomainError> {
    let trimmed: &str = text.trim();
    let length: usize = trimmed.chars().count();
    if length < minimum {
        return Err(DomainError::JustificationTooShort { length, minimum });
    }
    Ok(trimmed.to_string())
}
