// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_domain::DomainError;

/// Errors that can occur during state transitions.
///
/// Business refusals are not errors; they come back as
/// [`crate::Outcome::Rejected`]. These variants mean the caller handed the
/// transition an inconsistent snapshot or violated a structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The snapshot does not hold the participation the command names.
    ParticipationNotInSnapshot(i64),
    /// The snapshot does not hold the member the command names.
    MemberNotInSnapshot(i64),
    /// The command names an operation other than the snapshot's.
    OperationMismatch { expected: i64, actual: i64 },
    /// The operation was already deactivated.
    OperationAlreadyInactive(i64),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::ParticipationNotInSnapshot(id) => {
                write!(f, "Participation {id} is not part of the loaded operation")
            }
            Self::MemberNotInSnapshot(id) => {
                write!(f, "Member {id} was not loaded for this transition")
            }
            Self::OperationMismatch { expected, actual } => write!(
                f,
                "Command targets operation {actual} but operation {expected} was loaded"
            ),
            Self::OperationAlreadyInactive(id) => {
                write!(f, "Operation {id} is already inactive")
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
