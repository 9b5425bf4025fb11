// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;

/// Message raised by the capacity triggers.
pub(crate) const CAPACITY_EXCEEDED: &str = "capacity exceeded";

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// A stored value could not be converted back into a domain value.
    ReconstructionError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested operation does not exist.
    OperationNotFound(i64),
    /// The requested member does not exist.
    MemberNotFound(i64),
    /// The requested participation does not exist.
    ParticipationNotFound(i64),
    /// The requested window does not exist.
    WindowNotFound(i64),
    /// The capacity trigger refused a slot-holding write.
    CapacityExceeded(String),
    /// A uniqueness constraint was violated.
    UniqueViolation(String),
    /// A participation changed between the read and the write.
    ConcurrentModification(i64),
    /// The requested resource was not found.
    NotFound(String),
}

impl PersistenceError {
    /// Whether the write lost a race and may be retried against a fresh read.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded(_) | Self::UniqueViolation(_) | Self::ConcurrentModification(_)
        )
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Reconstruction error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::OperationNotFound(id) => write!(f, "Operation not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "Member not found: {id}"),
            Self::ParticipationNotFound(id) => write!(f, "Participation not found: {id}"),
            Self::WindowNotFound(id) => write!(f, "Window not found: {id}"),
            Self::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {msg}"),
            Self::UniqueViolation(msg) => write!(f, "Unique constraint violated: {msg}"),
            Self::ConcurrentModification(id) => {
                write!(f, "Participation {id} changed before it could be updated")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(_, info)
                if info.message().contains(CAPACITY_EXCEEDED) =>
            {
                Self::CapacityExceeded(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<muster_domain::DomainError> for PersistenceError {
    fn from(err: muster_domain::DomainError) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}

impl From<time::error::Parse> for PersistenceError {
    fn from(err: time::error::Parse) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}

impl From<time::error::Format> for PersistenceError {
    fn from(err: time::error::Format) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

impl From<muster_audit::UnknownVariant> for PersistenceError {
    fn from(err: muster_audit::UnknownVariant) -> Self {
        Self::ReconstructionError(err.to_string())
    }
}
