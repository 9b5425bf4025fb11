// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Muster scheduler.
//!
//! This crate stores windows, operations, members, participations and the
//! append-only audit trail in `SQLite` through Diesel.
//!
//! ## Write Model
//!
//! The core crate computes a complete write plan from a snapshot; this crate
//! executes that plan inside one transaction. The schema carries two
//! backstops that catch plans computed from a stale snapshot:
//!
//! - a partial unique index allowing one active participation per member
//!   and operation
//! - triggers refusing any write that would seat a regular participant in a
//!   full operation
//!
//! Both surface as conflict errors (see [`PersistenceError::is_conflict`])
//! so callers can re-read and retry.
//!
//! ## Change Propagation
//!
//! Each committed write yields [`ChangeNotification`]s. A [`ChangeSink`]
//! registered with [`Persistence::with_change_sink`] receives them after
//! commit. Queue rewrites are folded into a single operation touch rather
//! than one notification per shifted row.
//!
//! ## Testing Philosophy
//!
//! - Tests run against private in-memory databases
//! - Each in-memory database is isolated by an atomic counter
//! - Constraint backstops are exercised directly, bypassing the core crate

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
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use muster::{RosterChange, RosterCommand, RosterContext, Snapshot, TransitionResult};
use muster_audit::{Actor, AuditEvent, Justification};
use muster_domain::{AssignmentRecord, Member, Operation, Participation, Window};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based collisions.
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod changes;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use changes::{ChangeKind, ChangeNotification, ChangeSink, ChangeTable};
pub use data_models::{ExecutionReport, MemberParticipation, RosterRecord};
pub use error::PersistenceError;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
    sink: Option<Arc<dyn ChangeSink>>,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:memdb_muster_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn, sink: None })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn, sink: None })
    }

    /// Registers the sink that receives committed change notifications.
    #[must_use]
    pub fn with_change_sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    fn publish(&self, notifications: &[ChangeNotification]) {
        if let Some(sink) = &self.sink {
            for notification in notifications {
                sink.publish(notification);
            }
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Loads everything a participation transition reads.
    ///
    /// # Arguments
    ///
    /// * `operation_id` - The operation acted on
    /// * `subject_id` - The member the command is about, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the operation or subject does not exist.
    pub fn load_snapshot(
        &mut self,
        operation_id: i64,
        subject_id: Option<i64>,
    ) -> Result<Snapshot, PersistenceError> {
        queries::snapshot::load_snapshot(&mut self.conn, operation_id, subject_id)
    }

    /// Executes the write plan of a transition atomically, then publishes
    /// its change notifications.
    ///
    /// # Arguments
    ///
    /// * `operation_id` - The operation the plan was computed for
    /// * `result` - The transition result
    /// * `now` - The commit instant
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be committed. Nothing is written
    /// and nothing is published in that case.
    pub fn execute_transition(
        &mut self,
        operation_id: i64,
        result: &TransitionResult,
        now: OffsetDateTime,
    ) -> Result<ExecutionReport, PersistenceError> {
        let report: ExecutionReport =
            mutations::transition::execute_transition(&mut self.conn, operation_id, result, now)?;
        self.publish(&report.notifications);
        Ok(report)
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Loads the rows a roster command reads.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn load_roster_context(
        &mut self,
        command: &RosterCommand,
    ) -> Result<RosterContext, PersistenceError> {
        queries::roster::load_roster_context(&mut self.conn, command)
    }

    /// Persists a validated roster change, then publishes its notifications.
    ///
    /// # Arguments
    ///
    /// * `change` - The planned change
    /// * `actor` - The supervisor who issued the command
    /// * `now` - The commit instant
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn execute_roster_change(
        &mut self,
        change: &RosterChange,
        actor: Actor,
        now: OffsetDateTime,
    ) -> Result<RosterRecord, PersistenceError> {
        let (record, notifications): (RosterRecord, Vec<ChangeNotification>) =
            mutations::roster::execute_roster_change(&mut self.conn, change, actor, now)?;
        self.publish(&notifications);
        Ok(record)
    }

    /// Retrieves a window by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the window does not exist or the query fails.
    pub fn get_window(&mut self, window_id: i64) -> Result<Window, PersistenceError> {
        queries::roster::find_window(&mut self.conn, window_id)?
            .ok_or(PersistenceError::WindowNotFound(window_id))
    }

    /// Retrieves an operation by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation does not exist or the query fails.
    pub fn get_operation(&mut self, operation_id: i64) -> Result<Operation, PersistenceError> {
        queries::roster::find_operation(&mut self.conn, operation_id)?
            .ok_or(PersistenceError::OperationNotFound(operation_id))
    }

    /// Retrieves a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not exist or the query fails.
    pub fn get_member(&mut self, member_id: i64) -> Result<Member, PersistenceError> {
        queries::roster::find_member(&mut self.conn, member_id)?
            .ok_or(PersistenceError::MemberNotFound(member_id))
    }

    /// Lists all members.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_members(&mut self) -> Result<Vec<Member>, PersistenceError> {
        queries::roster::list_members(&mut self.conn)
    }

    /// Lists the active operations of a window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_window_operations(
        &mut self,
        window_id: i64,
    ) -> Result<Vec<Operation>, PersistenceError> {
        queries::roster::list_window_operations(&mut self.conn, window_id)
    }

    // ========================================================================
    // Participations
    // ========================================================================

    /// Retrieves a participation by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the participation does not exist or the query fails.
    pub fn get_participation(
        &mut self,
        participation_id: i64,
    ) -> Result<Participation, PersistenceError> {
        queries::snapshot::find_participation(&mut self.conn, participation_id)?
            .ok_or(PersistenceError::ParticipationNotFound(participation_id))
    }

    /// Retrieves the active participation of a member in an operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_active_participation(
        &mut self,
        operation_id: i64,
        member_id: i64,
    ) -> Result<Option<Participation>, PersistenceError> {
        queries::snapshot::find_active_participation(&mut self.conn, operation_id, member_id)
    }

    /// Lists every participation of an operation in request order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_operation_participations(
        &mut self,
        operation_id: i64,
    ) -> Result<Vec<Participation>, PersistenceError> {
        queries::snapshot::list_operation_participations(&mut self.conn, operation_id)
    }

    /// Lists a member's active participations with their operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_member_participations(
        &mut self,
        member_id: i64,
    ) -> Result<Vec<MemberParticipation>, PersistenceError> {
        queries::snapshot::list_member_participations(&mut self.conn, member_id)
    }

    /// Loads a member's slot-holding assignments on active operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_assignment_history(
        &mut self,
        member_id: i64,
    ) -> Result<Vec<AssignmentRecord>, PersistenceError> {
        queries::snapshot::list_assignment_history(&mut self.conn, member_id)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Lists the audit events of an operation in recording order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_operation_events(
        &mut self,
        operation_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_operation_events(&mut self.conn, operation_id)
    }

    /// Lists the audit events that touched a participation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_participation_events(
        &mut self,
        participation_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_participation_events(&mut self.conn, participation_id)
    }

    /// Lists the justifications recorded for a participation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_justifications(
        &mut self,
        participation_id: i64,
    ) -> Result<Vec<Justification>, PersistenceError> {
        queries::audit::list_justifications(&mut self.conn, participation_id)
    }

    // ========================================================================
    // Change Detection
    // ========================================================================

    /// Returns which of `operation_ids` saw any write at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails.
    pub fn operations_changed_since(
        &mut self,
        since: OffsetDateTime,
        operation_ids: &[i64],
    ) -> Result<BTreeSet<i64>, PersistenceError> {
        queries::watch::operations_changed_since(&mut self.conn, since, operation_ids)
    }
}
