// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{ApprovalMode, Command};
use crate::error::CoreError;
use crate::state::{
    Applied, NewParticipation, Outcome, ParticipationUpdate, ParticipationWrite, Snapshot,
    TransitionContext, TransitionResult,
};
use muster_audit::{Actor, AuditEvent, Cause, EventType, Justification, JustificationContext};
use muster_domain::{
    DomainError, Member, Occupancy, Operation, OperationStatus, Participation, ParticipationState,
    PositionChange, QuotaAssessment, Rejection, RejectionCode, Strategy, check_eligibility,
    choose_strategy, compaction_after_removal, describe, earliest_waiting, enqueue_state,
    next_queue_position, project_quota, renumber, revalidate, validate_justification,
};

/// Applies a participation command to a freshly loaded snapshot.
///
/// The snapshot is never modified. The returned `TransitionResult` carries
/// the outcome and the write plan the persistence layer executes.
///
/// # Arguments
///
/// * `snapshot` - The operation, subject member and participations as just read
/// * `command` - The command to apply
/// * `actor` - The member performing this action
/// * `context` - Clock and limits
///
/// # Errors
///
/// Returns an error if the snapshot does not match the command, or if quota
/// periods cannot be computed. Business refusals are returned as
/// `Outcome::Rejected`, not as errors.
pub fn apply(
    snapshot: &Snapshot,
    command: Command,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    if let Some(operation_id) = command.operation_id() {
        ensure_operation(snapshot, operation_id)?;
    }

    match command {
        Command::Join {
            member_id, planned, ..
        } => join(snapshot, member_id, &planned, actor, context),
        Command::Cancel {
            participation_id,
            reason,
        } => cancel(snapshot, participation_id, reason, actor, context),
        Command::Approve {
            participation_id,
            justification,
            mode,
        } => approve(
            snapshot,
            participation_id,
            justification.as_deref(),
            mode,
            actor,
            context,
        ),
        Command::Reject {
            participation_id,
            reason,
        } => reject(snapshot, participation_id, reason, actor, context),
        Command::AddDirect {
            member_id,
            justification,
            ..
        } => add_direct(
            snapshot,
            member_id,
            justification.as_deref(),
            actor,
            context,
        ),
        Command::ReorganizeQueue { .. } => Ok(reorganize_queue(snapshot, actor, context)),
    }
}

const fn ensure_operation(snapshot: &Snapshot, operation_id: i64) -> Result<(), CoreError> {
    if snapshot.operation.operation_id != operation_id {
        return Err(CoreError::OperationMismatch {
            expected: snapshot.operation.operation_id,
            actual: operation_id,
        });
    }
    Ok(())
}

fn subject(snapshot: &Snapshot, member_id: i64) -> Result<&Member, CoreError> {
    snapshot
        .subject
        .as_ref()
        .filter(|member| member.member_id == member_id)
        .ok_or(CoreError::MemberNotInSnapshot(member_id))
}

fn target(snapshot: &Snapshot, participation_id: i64) -> Result<&Participation, CoreError> {
    snapshot
        .participation(participation_id)
        .ok_or(CoreError::ParticipationNotInSnapshot(participation_id))
}

fn project(
    snapshot: &Snapshot,
    context: &TransitionContext<'_>,
) -> Result<QuotaAssessment, DomainError> {
    project_quota(
        context.policy,
        &snapshot.subject_history,
        &snapshot.candidate(),
    )
}

fn invalid_transition(participation: &Participation, target: ParticipationState) -> Rejection {
    Rejection::new(
        RejectionCode::InvalidTransition,
        format!(
            "Participation {} cannot move from {}{} to {target}",
            participation.participation_id,
            participation.state,
            if participation.active { "" } else { " (inactive)" }
        ),
    )
}

fn join(
    snapshot: &Snapshot,
    member_id: i64,
    planned: &Strategy,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let operation: &Operation = &snapshot.operation;
    let member: &Member = subject(snapshot, member_id)?;

    // A duplicate or a deactivation may have landed since the first pass.
    if let Err(rejection) = check_eligibility(
        operation,
        member,
        &snapshot.participations,
        context.today,
        context.policy,
    ) {
        return Ok(TransitionResult::rejected(rejection));
    }

    let fresh: Occupancy = Occupancy::of(operation, &snapshot.participations);
    let planned: Strategy = match choose_strategy(operation, &fresh) {
        Strategy::Rejected(rejection) => return Ok(TransitionResult::rejected(rejection)),
        _ if operation.status == OperationStatus::AwaitingReview => Strategy::Enqueue,
        _ => planned.clone(),
    };

    match revalidate(&planned, operation, &fresh, context.policy) {
        Strategy::Rejected(rejection) => Ok(TransitionResult::rejected(rejection)),
        Strategy::ConfirmDirect => {
            let assessment: QuotaAssessment = project(snapshot, context)?;
            if let Some(violation) = assessment.violation {
                return Ok(TransitionResult::rejected(Rejection::quota(
                    violation,
                    assessment.figures,
                )));
            }

            let message: String = describe(&Strategy::ConfirmDirect, operation, &fresh);
            let event: AuditEvent = AuditEvent::new(
                operation.operation_id,
                EventType::ParticipationConfirmed,
                actor,
                format!("Member {member_id} confirmed directly; {message}"),
                context.now,
            )
            .with_member(member_id)
            .with_change(None, ParticipationState::Confirmed);

            Ok(TransitionResult {
                outcome: Outcome::Applied(Applied {
                    strategy: Some(Strategy::ConfirmDirect),
                    state: Some(ParticipationState::Confirmed),
                    queue_position: None,
                    message,
                    figures: Some(assessment.figures),
                }),
                write: Some(ParticipationWrite::Insert(NewParticipation {
                    operation_id: operation.operation_id,
                    member_id,
                    state: ParticipationState::Confirmed,
                    queue_position: None,
                    requested_at: context.now,
                    capacity_override: false,
                })),
                queue_changes: Vec::new(),
                justification: None,
                audit_events: vec![event],
                touch: false,
            })
        }
        Strategy::Enqueue => {
            let state: ParticipationState = enqueue_state(operation);
            let (queue_position, event_type, message): (Option<u32>, EventType, String) =
                match state {
                    ParticipationState::Queued => {
                        let position: u32 = next_queue_position(&snapshot.participations);
                        (
                            Some(position),
                            EventType::ParticipationQueued,
                            format!("Operation is full; queued at position {position}"),
                        )
                    }
                    _ => (
                        None,
                        EventType::ParticipationPending,
                        describe(&Strategy::Enqueue, operation, &fresh),
                    ),
                };

            let event: AuditEvent = AuditEvent::new(
                operation.operation_id,
                event_type,
                actor,
                format!("Member {member_id} joined the waiting list; {message}"),
                context.now,
            )
            .with_member(member_id)
            .with_change(None, state);

            Ok(TransitionResult {
                outcome: Outcome::Applied(Applied {
                    strategy: Some(Strategy::Enqueue),
                    state: Some(state),
                    queue_position,
                    message,
                    figures: None,
                }),
                write: Some(ParticipationWrite::Insert(NewParticipation {
                    operation_id: operation.operation_id,
                    member_id,
                    state,
                    queue_position,
                    requested_at: context.now,
                    capacity_override: false,
                })),
                queue_changes: Vec::new(),
                justification: None,
                audit_events: vec![event],
                touch: false,
            })
        }
    }
}

fn cancel(
    snapshot: &Snapshot,
    participation_id: i64,
    reason: Option<String>,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let participation: &Participation = target(snapshot, participation_id)?;
    if !participation.active
        || !participation
            .state
            .can_transition_to(ParticipationState::Cancelled)
    {
        return Ok(TransitionResult::rejected(invalid_transition(
            participation,
            ParticipationState::Cancelled,
        )));
    }

    // Freed slots are never refilled automatically.
    let queue_changes: Vec<PositionChange> =
        compaction_after_removal(&snapshot.participations, participation);
    let message: String = if participation.holds_slot() {
        String::from("Participation cancelled; the slot is open for supervisor action")
    } else {
        String::from("Participation cancelled")
    };

    let event: AuditEvent = AuditEvent::new(
        snapshot.operation.operation_id,
        EventType::ParticipationCancelled,
        actor,
        message.clone(),
        context.now,
    )
    .with_member(participation.member_id)
    .with_participation(participation_id)
    .with_change(Some(participation.state), ParticipationState::Cancelled)
    .with_cause(reason.map(Cause::new));

    Ok(TransitionResult {
        outcome: Outcome::Applied(Applied {
            strategy: None,
            state: Some(ParticipationState::Cancelled),
            queue_position: None,
            message,
            figures: None,
        }),
        write: Some(ParticipationWrite::Update(ParticipationUpdate {
            participation_id,
            from: participation.state,
            to: ParticipationState::Cancelled,
            queue_position: None,
            active: false,
        })),
        touch: !queue_changes.is_empty(),
        queue_changes,
        justification: None,
        audit_events: vec![event],
    })
}

/// Supervisor placements are refused once the roster is closed.
fn roster_closed(operation: &Operation) -> Option<Rejection> {
    matches!(
        operation.status,
        OperationStatus::Cancelled | OperationStatus::Finalized
    )
    .then(|| {
        Rejection::new(
            RejectionCode::InvalidParticipationStatus,
            format!(
                "Operation {} is {} and takes no further placements",
                operation.operation_id,
                operation.status.as_str()
            ),
        )
    })
}

#[allow(clippy::too_many_lines)]
fn approve(
    snapshot: &Snapshot,
    participation_id: i64,
    justification: Option<&str>,
    mode: ApprovalMode,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let operation: &Operation = &snapshot.operation;
    let participation: &Participation = target(snapshot, participation_id)?;

    if !participation.is_waiting() {
        return Ok(TransitionResult::rejected(invalid_transition(
            participation,
            ParticipationState::Confirmed,
        )));
    }
    if !operation.active {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::OperationInactive,
            format!("Operation {} is inactive", operation.operation_id),
        )));
    }
    if let Some(rejection) = roster_closed(operation) {
        return Ok(TransitionResult::rejected(rejection));
    }
    let member: &Member = subject(snapshot, participation.member_id)?;
    if !member.active {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::MemberInactive,
            format!("Member {} is inactive", member.member_id),
        )));
    }

    let occupancy: Occupancy = Occupancy::of(operation, &snapshot.participations);
    if !occupancy.has_vacancy() {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::NoVacancy,
            format!(
                "Operation {} is full ({} of {})",
                operation.operation_id, occupancy.confirmed, occupancy.capacity
            ),
        )));
    }

    let skipped: Option<i64> = earliest_waiting(&snapshot.participations)
        .map(|earliest| earliest.participation_id)
        .filter(|earliest| *earliest != participation_id);

    let recorded: Option<Justification> = match (mode, skipped) {
        (ApprovalMode::Individual, Some(skipped_id)) => {
            let Some(text) = justification.filter(|text| !text.trim().is_empty()) else {
                return Ok(TransitionResult::rejected(Rejection::new(
                    RejectionCode::JustificationRequired,
                    format!(
                        "Approving participation {participation_id} ahead of \
                         {skipped_id} requires a justification"
                    ),
                )));
            };
            let Ok(text) = validate_justification(text, context.policy.justification_min_chars)
            else {
                return Ok(TransitionResult::rejected(Rejection::new(
                    RejectionCode::JustificationTooShort,
                    format!(
                        "Justification must have at least {} characters",
                        context.policy.justification_min_chars
                    ),
                )));
            };
            Some(Justification {
                justification_id: None,
                participation_id: Some(participation_id),
                supervisor_id: actor.member_id,
                text,
                context: JustificationContext::FifoSkip,
                skipped_participation_id: Some(skipped_id),
                recorded_at: context.now,
            })
        }
        _ => None,
    };

    let assessment: QuotaAssessment = project(snapshot, context)?;
    if let Some(violation) = assessment.violation {
        return Ok(TransitionResult::rejected(Rejection::quota(
            violation,
            assessment.figures,
        )));
    }

    let queue_changes: Vec<PositionChange> =
        compaction_after_removal(&snapshot.participations, participation);
    let message: String = match (mode, skipped) {
        (ApprovalMode::Individual, Some(skipped_id)) => format!(
            "Participation {participation_id} approved ahead of participation {skipped_id}"
        ),
        (ApprovalMode::Bulk, _) => {
            format!("Participation {participation_id} approved into a direct slot")
        }
        (ApprovalMode::Individual, None) => format!("Participation {participation_id} approved"),
    };

    let event: AuditEvent = AuditEvent::new(
        operation.operation_id,
        EventType::ParticipationApproved,
        actor,
        message.clone(),
        context.now,
    )
    .with_member(participation.member_id)
    .with_participation(participation_id)
    .with_change(Some(participation.state), ParticipationState::Confirmed);

    Ok(TransitionResult {
        outcome: Outcome::Applied(Applied {
            strategy: None,
            state: Some(ParticipationState::Confirmed),
            queue_position: None,
            message,
            figures: Some(assessment.figures),
        }),
        write: Some(ParticipationWrite::Update(ParticipationUpdate {
            participation_id,
            from: participation.state,
            to: ParticipationState::Confirmed,
            queue_position: None,
            active: true,
        })),
        touch: !queue_changes.is_empty(),
        queue_changes,
        justification: recorded,
        audit_events: vec![event],
    })
}

fn reject(
    snapshot: &Snapshot,
    participation_id: i64,
    reason: Option<String>,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let participation: &Participation = target(snapshot, participation_id)?;
    if !participation.is_waiting() {
        return Ok(TransitionResult::rejected(invalid_transition(
            participation,
            ParticipationState::Rejected,
        )));
    }

    let queue_changes: Vec<PositionChange> =
        compaction_after_removal(&snapshot.participations, participation);
    let message: String = format!("Participation {participation_id} rejected");

    let event: AuditEvent = AuditEvent::new(
        snapshot.operation.operation_id,
        EventType::ParticipationRejected,
        actor,
        message.clone(),
        context.now,
    )
    .with_member(participation.member_id)
    .with_participation(participation_id)
    .with_change(Some(participation.state), ParticipationState::Rejected)
    .with_cause(reason.map(Cause::new));

    Ok(TransitionResult {
        outcome: Outcome::Applied(Applied {
            strategy: None,
            state: Some(ParticipationState::Rejected),
            queue_position: None,
            message,
            figures: None,
        }),
        write: Some(ParticipationWrite::Update(ParticipationUpdate {
            participation_id,
            from: participation.state,
            to: ParticipationState::Rejected,
            queue_position: None,
            active: false,
        })),
        touch: !queue_changes.is_empty(),
        queue_changes,
        justification: None,
        audit_events: vec![event],
    })
}

fn add_direct(
    snapshot: &Snapshot,
    member_id: i64,
    justification: Option<&str>,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> Result<TransitionResult, CoreError> {
    let operation: &Operation = &snapshot.operation;
    let member: &Member = subject(snapshot, member_id)?;

    if !operation.active {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::OperationInactive,
            format!("Operation {} is inactive", operation.operation_id),
        )));
    }
    if let Some(rejection) = roster_closed(operation) {
        return Ok(TransitionResult::rejected(rejection));
    }
    if !member.active {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::MemberInactive,
            format!("Member {member_id} is inactive"),
        )));
    }
    if snapshot
        .participations
        .iter()
        .any(|p| p.active && p.member_id == member_id)
    {
        return Ok(TransitionResult::rejected(Rejection::new(
            RejectionCode::DuplicateParticipation,
            format!(
                "Member {member_id} already has an active participation in operation {}",
                operation.operation_id
            ),
        )));
    }

    let text: Option<String> = match justification.filter(|text| !text.trim().is_empty()) {
        Some(text) => match validate_justification(text, context.policy.justification_min_chars) {
            Ok(text) => Some(text),
            Err(_) => {
                return Ok(TransitionResult::rejected(Rejection::new(
                    RejectionCode::JustificationTooShort,
                    format!(
                        "Justification must have at least {} characters",
                        context.policy.justification_min_chars
                    ),
                )));
            }
        },
        None => None,
    };

    let assessment: QuotaAssessment = project(snapshot, context)?;
    if let Some(violation) = assessment.violation {
        return Ok(TransitionResult::rejected(Rejection::quota(
            violation,
            assessment.figures,
        )));
    }

    let occupancy: Occupancy = Occupancy::of(operation, &snapshot.participations);
    let capacity_override: bool = !occupancy.has_vacancy();
    let message: String = if capacity_override {
        format!(
            "Member {member_id} added by supervisor beyond capacity ({} of {})",
            occupancy.confirmed + 1,
            occupancy.capacity
        )
    } else {
        format!("Member {member_id} added by supervisor")
    };

    let event: AuditEvent = AuditEvent::new(
        operation.operation_id,
        EventType::SupervisorAdded,
        actor,
        message.clone(),
        context.now,
    )
    .with_member(member_id)
    .with_change(None, ParticipationState::SupervisorAdded);

    Ok(TransitionResult {
        outcome: Outcome::Applied(Applied {
            strategy: None,
            state: Some(ParticipationState::SupervisorAdded),
            queue_position: None,
            message,
            figures: Some(assessment.figures),
        }),
        write: Some(ParticipationWrite::Insert(NewParticipation {
            operation_id: operation.operation_id,
            member_id,
            state: ParticipationState::SupervisorAdded,
            queue_position: None,
            requested_at: context.now,
            capacity_override,
        })),
        queue_changes: Vec::new(),
        justification: text.map(|text| Justification {
            justification_id: None,
            participation_id: None,
            supervisor_id: actor.member_id,
            text,
            context: JustificationContext::SupervisorAdd,
            skipped_participation_id: None,
            recorded_at: context.now,
        }),
        audit_events: vec![event],
        touch: false,
    })
}

fn reorganize_queue(
    snapshot: &Snapshot,
    actor: Actor,
    context: &TransitionContext<'_>,
) -> TransitionResult {
    let queue_changes: Vec<PositionChange> = renumber(&snapshot.participations);
    if queue_changes.is_empty() {
        return TransitionResult {
            outcome: Outcome::Applied(Applied {
                strategy: None,
                state: None,
                queue_position: None,
                message: String::from("Queue already in request order"),
                figures: None,
            }),
            write: None,
            queue_changes,
            justification: None,
            audit_events: Vec::new(),
            touch: false,
        };
    }

    let message: String = format!("Queue renumbered; {} position(s) changed", queue_changes.len());
    let event: AuditEvent = AuditEvent::new(
        snapshot.operation.operation_id,
        EventType::QueueReorganized,
        actor,
        message.clone(),
        context.now,
    );

    TransitionResult {
        outcome: Outcome::Applied(Applied {
            strategy: None,
            state: None,
            queue_position: None,
            message,
            figures: None,
        }),
        write: None,
        queue_changes,
        justification: None,
        audit_events: vec![event],
        touch: true,
    }
}
