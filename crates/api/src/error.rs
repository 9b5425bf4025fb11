// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.
//!
//! Business refusals are not errors; they travel as unsuccessful
//! `OutcomeResponse` values. `ApiError` covers everything else: unknown
//! rows, bad input, missing permission and infrastructure failures.

use muster::CoreError;
use muster_domain::DomainError;
use muster_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Kinds of rows a request can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Window,
    Operation,
    Member,
    Participation,
}

impl Resource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Window => "Window",
            Self::Operation => "Operation",
            Self::Member => "Member",
            Self::Participation => "Participation",
        }
    }
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The kind of resource that was not found.
        resource: Resource,
        /// A human-readable description of what was looked up.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Builds a not-found error for a row looked up by id.
    #[must_use]
    pub fn not_found(resource: Resource, id: i64) -> Self {
        Self::ResourceNotFound {
            resource,
            message: format!("{} {id} does not exist", resource.as_str()),
        }
    }

    /// The stable error code reported to callers, when one exists.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized { .. } => Some("PERMISSAO_NEGADA"),
            Self::ResourceNotFound { resource, .. } => match resource {
                Resource::Operation => Some("OPERACAO_NAO_ENCONTRADA"),
                Resource::Member => Some("MEMBRO_NAO_ENCONTRADO"),
                Resource::Participation => Some("PARTICIPACAO_NAO_ENCONTRADA"),
                Resource::Window => Some("JANELA_NAO_ENCONTRADA"),
            },
            Self::AuthenticationFailed { .. }
            | Self::DomainRuleViolation { .. }
            | Self::InvalidInput { .. }
            | Self::Internal { .. } => None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound { resource, message } => {
                write!(f, "{} not found: {message}", resource.as_str())
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidWindowRange { start, end } => ApiError::InvalidInput {
            field: String::from("end"),
            message: format!("Window ends on {end}, before it starts on {start}"),
        },
        DomainError::NoModalitiesAllowed => ApiError::InvalidInput {
            field: String::from("modalities"),
            message: String::from("At least one modality must be allowed"),
        },
        DomainError::InvalidDailyOperationLimit(limit) => ApiError::InvalidInput {
            field: String::from("daily_operation_limit"),
            message: format!("Invalid daily operation limit: {limit}. Must be greater than 0"),
        },
        DomainError::InvalidCapacity(capacity) => ApiError::InvalidInput {
            field: String::from("capacity"),
            message: format!("Invalid capacity: {capacity}. Must be greater than 0"),
        },
        DomainError::ModalityNotAllowed(modality) => ApiError::DomainRuleViolation {
            rule: String::from("window_modality"),
            message: format!("Modality {modality} is not allowed in this window"),
        },
        DomainError::DateOutsideWindow { date, start, end } => ApiError::DomainRuleViolation {
            rule: String::from("window_range"),
            message: format!("Date {date} falls outside the window {start} to {end}"),
        },
        DomainError::DailyOperationLimitReached { date, limit } => {
            ApiError::DomainRuleViolation {
                rule: String::from("daily_operation_limit"),
                message: format!("The window already holds {limit} operation(s) on {date}"),
            }
        }
        DomainError::WindowInactive(window_id) => ApiError::DomainRuleViolation {
            rule: String::from("active_window"),
            message: format!("Window {window_id} is missing or inactive"),
        },
        DomainError::InvalidStatusTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("operation_status_transition"),
            message: format!("Operation status cannot change from {from} to {to}"),
        },
        DomainError::JustificationTooShort { length, minimum } => ApiError::InvalidInput {
            field: String::from("justification"),
            message: format!(
                "Justification has {length} character(s); at least {minimum} are required"
            ),
        },
        DomainError::InvalidMemberName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidModality(value) => ApiError::InvalidInput {
            field: String::from("modality"),
            message: format!("Unknown modality '{value}'"),
        },
        DomainError::InvalidOperationKind(value) => ApiError::InvalidInput {
            field: String::from("kind"),
            message: format!("Unknown operation kind '{value}'"),
        },
        DomainError::InvalidOperationStatus(value) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Unknown operation status '{value}'"),
        },
        DomainError::InvalidParticipationState(value) => ApiError::Internal {
            message: format!("Stored participation state '{value}' is not recognised"),
        },
        DomainError::InvalidMemberRole(value) => ApiError::InvalidInput {
            field: String::from("role"),
            message: format!("Unknown member role '{value}'"),
        },
        DomainError::InvalidTimezone(zone) => ApiError::Internal {
            message: format!("Configured timezone '{zone}' is not recognised"),
        },
        DomainError::InvalidPolicy(msg) => ApiError::Internal {
            message: format!("Scheduling policy is invalid: {msg}"),
        },
        DomainError::DateArithmeticOverflow => ApiError::InvalidInput {
            field: String::from("date"),
            message: String::from("Date is out of the supported range"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::ParticipationNotInSnapshot(id) => {
            ApiError::not_found(Resource::Participation, id)
        }
        CoreError::MemberNotInSnapshot(id) => ApiError::not_found(Resource::Member, id),
        CoreError::OperationMismatch { actual, .. } => {
            ApiError::not_found(Resource::Operation, actual)
        }
        CoreError::OperationAlreadyInactive(id) => ApiError::DomainRuleViolation {
            rule: String::from("active_operation"),
            message: format!("Operation {id} is already inactive"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Missing rows keep their identity; every other store failure becomes a
/// generic internal error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::OperationNotFound(id) => ApiError::not_found(Resource::Operation, id),
        PersistenceError::MemberNotFound(id) => ApiError::not_found(Resource::Member, id),
        PersistenceError::ParticipationNotFound(id) => {
            ApiError::not_found(Resource::Participation, id)
        }
        PersistenceError::WindowNotFound(id) => ApiError::not_found(Resource::Window, id),
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
