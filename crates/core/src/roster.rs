// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Validation and audit planning for roster commands.
//!
//! Roster commands reshape windows, operations and members. They never touch
//! participations, so they plan against the rows they name instead of a full
//! [`crate::Snapshot`].

use crate::command::RosterCommand;
use crate::error::CoreError;
use muster_audit::{Actor, AuditEvent, EventType};
use muster_domain::{
    DomainError, Member, MemberRole, Modality, Operation, OperationKind, OperationStatus, Window,
    validate_capacity, validate_member_name, validate_operation_placement,
    validate_status_change,
};
use time::{Date, OffsetDateTime};

/// The rows a roster command reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterContext {
    /// The enclosing window, for operation creation.
    pub window: Option<Window>,
    /// Active operations already placed on the requested day.
    pub operations_on_day: u32,
    /// The operation a status command targets.
    pub operation: Option<Operation>,
    /// The member a member command targets.
    pub member: Option<Member>,
}

/// A validated operation awaiting insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOperation {
    pub window_id: i64,
    pub date: Date,
    pub modality: Modality,
    pub kind: OperationKind,
    pub capacity: u32,
}

/// A validated member awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub role: MemberRole,
}

/// The write a roster command resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    InsertWindow(Window),
    /// The operation id of the creation event is assigned on insert.
    InsertOperation(NewOperation),
    UpdateOperation {
        operation: Operation,
        audit_event: AuditEvent,
    },
    InsertMember(NewMember),
    UpdateMember(Member),
}

/// Validates a roster command and plans its write.
///
/// # Arguments
///
/// * `context` - The rows the command reads
/// * `command` - The roster command
/// * `actor` - The supervisor performing this action
/// * `now` - The current instant, for audit timestamps
///
/// # Errors
///
/// Returns an error if the command violates domain rules or the context is
/// missing a row the command needs.
pub fn apply_roster(
    context: &RosterContext,
    command: RosterCommand,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<RosterChange, CoreError> {
    match command {
        RosterCommand::CreateWindow {
            start,
            end,
            modalities,
            daily_operation_limit,
        } => {
            let window: Window = Window::new(start, end, modalities, daily_operation_limit)?;
            Ok(RosterChange::InsertWindow(window))
        }
        RosterCommand::CreateOperation {
            window_id,
            date,
            modality,
            kind,
            capacity,
        } => {
            let window: &Window = context
                .window
                .as_ref()
                .ok_or(DomainError::WindowInactive(window_id))?;
            validate_capacity(capacity)?;
            validate_operation_placement(window, date, modality, context.operations_on_day)?;
            Ok(RosterChange::InsertOperation(NewOperation {
                window_id,
                date,
                modality,
                kind,
                capacity,
            }))
        }
        RosterCommand::SetOperationStatus {
            operation_id,
            status,
        } => {
            let current: &Operation = target_operation(context, operation_id)?;
            validate_status_change(current.status, status)?;

            let mut operation: Operation = current.clone();
            operation.status = status;
            let audit_event: AuditEvent = AuditEvent::new(
                operation_id,
                EventType::OperationStatusChanged,
                actor,
                format!("Status changed from {} to {status}", current.status),
                now,
            );
            Ok(RosterChange::UpdateOperation {
                operation,
                audit_event,
            })
        }
        RosterCommand::DeactivateOperation { operation_id } => {
            let current: &Operation = target_operation(context, operation_id)?;

            let mut operation: Operation = current.clone();
            operation.active = false;
            let audit_event: AuditEvent = AuditEvent::new(
                operation_id,
                EventType::OperationDeactivated,
                actor,
                format!("Operation {operation_id} deactivated"),
                now,
            );
            Ok(RosterChange::UpdateOperation {
                operation,
                audit_event,
            })
        }
        RosterCommand::RegisterMember { name, role } => {
            validate_member_name(&name)?;
            Ok(RosterChange::InsertMember(NewMember {
                name: name.trim().to_string(),
                role,
            }))
        }
        RosterCommand::SetMemberActive { member_id, active } => {
            let mut member: Member = context
                .member
                .clone()
                .filter(|member| member.member_id == member_id)
                .ok_or(CoreError::MemberNotInSnapshot(member_id))?;
            member.active = active;
            Ok(RosterChange::UpdateMember(member))
        }
    }
}

fn target_operation(context: &RosterContext, operation_id: i64) -> Result<&Operation, CoreError> {
    let operation: &Operation = context
        .operation
        .as_ref()
        .filter(|operation| operation.operation_id == operation_id)
        .ok_or(CoreError::OperationMismatch {
            expected: context
                .operation
                .as_ref()
                .map_or(0, |operation| operation.operation_id),
            actual: operation_id,
        })?;
    if !operation.active {
        return Err(CoreError::OperationAlreadyInactive(operation_id));
    }
    Ok(operation)
}

/// Builds the creation event for an operation that was just inserted.
#[must_use]
pub fn operation_created_event(
    operation: &Operation,
    actor: Actor,
    now: OffsetDateTime,
) -> AuditEvent {
    AuditEvent::new(
        operation.operation_id,
        EventType::OperationCreated,
        actor,
        format!(
            "{} {} operation on {} with capacity {}",
            operation.kind, operation.modality, operation.date, operation.capacity
        ),
        now,
    )
}

/// Whether the status accepts join requests, exposed for summaries.
#[must_use]
pub const fn accepts_participations(operation: &Operation) -> bool {
    operation.active && operation.status.accepts_requests()
}

impl NewOperation {
    /// The operation as it will be stored, given its assigned id.
    #[must_use]
    pub const fn into_operation(self, operation_id: i64) -> Operation {
        Operation {
            operation_id,
            window_id: self.window_id,
            date: self.date,
            modality: self.modality,
            kind: self.kind,
            status: OperationStatus::OpenForDirectJoin,
            capacity: self.capacity,
            active: true,
        }
    }
}
