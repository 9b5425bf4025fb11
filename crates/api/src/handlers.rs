// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handlers.
//!
//! Every handler authorizes the actor first, then reads fresh state, applies
//! the command through the core and hands the resulting write plan to the
//! persistence layer. Nothing is cached between calls.

use muster::{
    ApprovalMode, Command, RosterChange, RosterCommand, RosterContext, Snapshot,
    TransitionContext, TransitionResult, accepts_participations, apply, apply_roster,
};
use muster_audit::Actor;
use muster_domain::{
    AdmissionDecision, AssignmentRecord, Member, MemberRole, Modality, Occupancy, Operation,
    OperationKind, OperationStatus, Participation, QuotaStatus, SchedulingPolicy, Strategy,
    direct_slot_candidates, evaluate_admission, operational_today, quota_status, standing_of,
};
use muster_persistence::{Persistence, RosterRecord};
use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::{
    ApiError, Resource, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
use crate::request_response::{
    AddDirectRequest, ApproveRequest, CancelRequest, CancelTarget, CreateOperationRequest,
    CreateWindowRequest, JoinRequest, ListMembersResponse, ListOperationsResponse, MemberInfo,
    MemberParticipationsResponse, OperationHistoryResponse, OperationInfo, OperationRequest,
    OperationSummaryResponse, OutcomeResponse, ParticipationHistoryResponse, PositionResponse,
    QuotaStatusRequest, QuotaStatusResponse, RegisterMemberRequest, RejectRequest,
    SetMemberActiveRequest, SetOperationStatusRequest, WindowInfo,
};

/// Attempts per command. A write that loses a race is re-planned once
/// against a fresh read.
const MAX_ATTEMPTS: u32 = 2;

/// Resolves the operational date of `now`.
fn today(now: OffsetDateTime, policy: &SchedulingPolicy) -> Result<Date, ApiError> {
    operational_today(now, &policy.timezone).map_err(translate_domain_error)
}

/// Applies a participation command against a fresh snapshot and persists
/// the plan.
///
/// A conflict reported by the store (capacity trigger, unique index or an
/// optimistic guard) triggers one re-read and re-plan. Any further failure
/// surfaces as an internal error.
fn run_command(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    operation_id: i64,
    subject_id: Option<i64>,
    command: &Command,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    let context: TransitionContext<'_> = TransitionContext {
        now,
        today: today(now, policy)?,
        policy,
    };
    let audit_actor: Actor = actor.to_audit_actor();

    let mut attempt: u32 = 1;
    loop {
        let snapshot: Snapshot = persistence
            .load_snapshot(operation_id, subject_id)
            .map_err(translate_persistence_error)?;
        let result: TransitionResult =
            apply(&snapshot, command.clone(), audit_actor, &context).map_err(translate_core_error)?;

        if !result.outcome.is_applied() {
            let response: OutcomeResponse = OutcomeResponse::from_result(&result, None);
            info!(
                operation_id,
                actor = actor.member_id,
                code = response.error_code.as_deref().unwrap_or_default(),
                "Command refused"
            );
            return Ok(response);
        }

        match persistence.execute_transition(operation_id, &result, now) {
            Ok(report) => {
                return Ok(OutcomeResponse::from_result(
                    &result,
                    report.participation_id,
                ));
            }
            Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                warn!(operation_id, attempt, error = %e, "Write lost a race, re-planning");
                attempt += 1;
            }
            Err(e) => {
                error!(operation_id, error = %e, "Failed to persist transition");
                return Err(translate_persistence_error(e));
            }
        }
    }
}

/// Counts an operation's slots as currently stored.
fn current_occupancy(
    persistence: &mut Persistence,
    operation_id: i64,
) -> Result<Occupancy, ApiError> {
    let operation: Operation = persistence
        .get_operation(operation_id)
        .map_err(translate_persistence_error)?;
    let participations: Vec<Participation> = persistence
        .list_operation_participations(operation_id)
        .map_err(translate_persistence_error)?;
    Ok(Occupancy::of(&operation, &participations))
}

/// Loads a participation and rejects ids that do not exist.
fn load_participation(
    persistence: &mut Persistence,
    participation_id: i64,
) -> Result<Participation, ApiError> {
    persistence
        .get_participation(participation_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Participation commands
// ============================================================================

/// Requests a place in an operation.
///
/// The first admission pass decides the strategy against one read; the
/// command then re-validates that strategy against a second, fresh read
/// before anything is written. A refusal from the first pass reports the
/// occupancy it decided on; otherwise the occupancy is read back after the
/// command, so it includes the participation just written.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - The scheduling policy
/// * `request` - The join request
/// * `authenticated_actor` - The authenticated actor making this request
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if the actor may not join for the member, if the
/// operation or member does not exist, or if the write fails. Business
/// refusals are returned as unsuccessful responses.
pub fn join(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &JoinRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    AuthorizationService::authorize_self_or_supervisor(
        authenticated_actor,
        request.member_id,
        "join",
    )?;

    let snapshot: Snapshot = persistence
        .load_snapshot(request.operation_id, Some(request.member_id))
        .map_err(translate_persistence_error)?;
    let member: &Member = snapshot
        .subject
        .as_ref()
        .ok_or_else(|| ApiError::not_found(Resource::Member, request.member_id))?;

    let decision: AdmissionDecision = evaluate_admission(
        &snapshot.operation,
        member,
        &snapshot.participations,
        today(now, policy)?,
        policy,
    );
    debug!(
        operation_id = request.operation_id,
        member_id = request.member_id,
        strategy = decision.strategy.name(),
        "Admission evaluated"
    );

    if let Strategy::Rejected(rejection) = &decision.strategy {
        info!(
            operation_id = request.operation_id,
            member_id = request.member_id,
            code = rejection.code.as_str(),
            "Join refused"
        );
        return Ok(OutcomeResponse::from_rejection(rejection).with_occupancy(decision.occupancy));
    }

    let command: Command = Command::Join {
        operation_id: request.operation_id,
        member_id: request.member_id,
        planned: decision.strategy,
    };
    let response: OutcomeResponse = run_command(
        persistence,
        policy,
        request.operation_id,
        Some(request.member_id),
        &command,
        authenticated_actor,
        now,
    )?;
    let occupancy: Occupancy = current_occupancy(persistence, request.operation_id)?;
    Ok(response.with_occupancy(occupancy))
}

/// Withdraws a participation.
///
/// A freed slot is never refilled automatically; waiting entries stay where
/// they are until a supervisor acts.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - The scheduling policy
/// * `request` - The participation, or the operation and member, to cancel
/// * `authenticated_actor` - The authenticated actor making this request
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if no such participation exists, if a member cancels on
/// behalf of someone else, or if the write fails.
pub fn cancel(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &CancelRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    let participation: Participation = match request.target {
        CancelTarget::Participation { participation_id } => {
            load_participation(persistence, participation_id)?
        }
        CancelTarget::Member {
            operation_id,
            member_id,
        } => persistence
            .find_active_participation(operation_id, member_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| ApiError::ResourceNotFound {
                resource: Resource::Participation,
                message: format!(
                    "Member {member_id} has no active participation in operation {operation_id}"
                ),
            })?,
    };

    AuthorizationService::authorize_self_or_supervisor(
        authenticated_actor,
        participation.member_id,
        "cancel",
    )?;

    let command: Command = Command::Cancel {
        participation_id: participation.participation_id,
        reason: request.reason.clone(),
    };
    run_command(
        persistence,
        policy,
        participation.operation_id,
        Some(participation.member_id),
        &command,
        authenticated_actor,
        now,
    )
}

/// Confirms a waiting participation.
///
/// This is shared by individual and bulk approval.
///
/// # Errors
///
/// Returns an error if the participation does not exist or the write fails.
pub(crate) fn approve_participation(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    participation_id: i64,
    justification: Option<String>,
    mode: ApprovalMode,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    let participation: Participation = load_participation(persistence, participation_id)?;
    let command: Command = Command::Approve {
        participation_id,
        justification,
        mode,
    };
    run_command(
        persistence,
        policy,
        participation.operation_id,
        Some(participation.member_id),
        &command,
        authenticated_actor,
        now,
    )
}

/// Confirms a waiting participation, chosen by a supervisor.
///
/// Approving anything but the earliest waiting request needs a
/// justification, which is stored before the state change commits. The
/// member's quota is checked against the operation being approved.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - The scheduling policy
/// * `request` - The approval request
/// * `authenticated_actor` - The authenticated actor making this request
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the participation does
/// not exist, or the write fails.
pub fn approve(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &ApproveRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "approve")?;
    approve_participation(
        persistence,
        policy,
        request.participation_id,
        request.justification.clone(),
        ApprovalMode::Individual,
        authenticated_actor,
        now,
    )
}

/// Declines a waiting participation.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the participation does
/// not exist, or the write fails.
pub fn reject(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &RejectRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "reject")?;

    let participation: Participation = load_participation(persistence, request.participation_id)?;
    let command: Command = Command::Reject {
        participation_id: request.participation_id,
        reason: request.reason.clone(),
    };
    run_command(
        persistence,
        policy,
        participation.operation_id,
        Some(participation.member_id),
        &command,
        authenticated_actor,
        now,
    )
}

/// Places a member directly, even past capacity.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `policy` - The scheduling policy
/// * `request` - The direct-add request
/// * `authenticated_actor` - The authenticated actor making this request
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the operation or
/// member does not exist, or the write fails.
pub fn add_direct(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &AddDirectRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "add_direct")?;

    let command: Command = Command::AddDirect {
        operation_id: request.operation_id,
        member_id: request.member_id,
        justification: request.justification.clone(),
    };
    run_command(
        persistence,
        policy,
        request.operation_id,
        Some(request.member_id),
        &command,
        authenticated_actor,
        now,
    )
}

/// Renumbers an operation's queue 1..N in request order.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the operation does
/// not exist, or the write fails.
pub fn reorganize_queue(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &OperationRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OutcomeResponse, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "reorganize_queue")?;

    let command: Command = Command::ReorganizeQueue {
        operation_id: request.operation_id,
    };
    run_command(
        persistence,
        policy,
        request.operation_id,
        None,
        &command,
        authenticated_actor,
        now,
    )
}

// ============================================================================
// Reads
// ============================================================================

/// Reports a member's place in an operation.
///
/// # Errors
///
/// Returns an error if a member asks about someone else or the operation
/// does not exist.
pub fn get_position(
    persistence: &mut Persistence,
    operation_id: i64,
    member_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<PositionResponse, ApiError> {
    AuthorizationService::authorize_self_or_supervisor(
        authenticated_actor,
        member_id,
        "get_position",
    )?;

    persistence
        .get_operation(operation_id)
        .map_err(translate_persistence_error)?;
    let participations: Vec<Participation> = persistence
        .list_operation_participations(operation_id)
        .map_err(translate_persistence_error)?;

    let response: PositionResponse = match standing_of(&participations, member_id) {
        None => PositionResponse {
            operation_id,
            member_id,
            participation_id: None,
            state: None,
            position: None,
            ahead: 0,
            message: String::from("No active participation in this operation"),
        },
        Some(standing) => {
            let message: String = match standing.position {
                None => format!("Holding a slot ({})", standing.state),
                Some(position) => format!(
                    "Waiting at position {position} with {} request(s) ahead",
                    standing.ahead
                ),
            };
            PositionResponse {
                operation_id,
                member_id,
                participation_id: Some(standing.participation_id),
                state: Some(standing.state),
                position: standing.position,
                ahead: standing.ahead,
                message,
            }
        }
    };
    Ok(response)
}

/// Reports a member's quota standing for the cycle and month of a date.
///
/// # Errors
///
/// Returns an error if a member asks about someone else, the member does
/// not exist, or period boundaries cannot be computed.
pub fn get_quota_status(
    persistence: &mut Persistence,
    policy: &SchedulingPolicy,
    request: &QuotaStatusRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<QuotaStatusResponse, ApiError> {
    AuthorizationService::authorize_self_or_supervisor(
        authenticated_actor,
        request.member_id,
        "get_quota_status",
    )?;

    persistence
        .get_member(request.member_id)
        .map_err(translate_persistence_error)?;
    let history: Vec<AssignmentRecord> = persistence
        .list_assignment_history(request.member_id)
        .map_err(translate_persistence_error)?;
    let status: QuotaStatus =
        quota_status(policy, &history, request.date).map_err(translate_domain_error)?;

    Ok(QuotaStatusResponse::new(request.member_id, status))
}

/// Summarises an operation's occupancy.
///
/// # Errors
///
/// Returns an error if the operation does not exist.
pub fn get_operation_summary(
    persistence: &mut Persistence,
    request: &OperationRequest,
) -> Result<OperationSummaryResponse, ApiError> {
    let operation: Operation = persistence
        .get_operation(request.operation_id)
        .map_err(translate_persistence_error)?;
    let participations: Vec<Participation> = persistence
        .list_operation_participations(request.operation_id)
        .map_err(translate_persistence_error)?;
    let occupancy: Occupancy = Occupancy::of(&operation, &participations);

    Ok(OperationSummaryResponse {
        operation: OperationInfo::from(&operation),
        vacancies: occupancy.remaining(),
        waiting: occupancy.waiting(),
        accepting: accepts_participations(&operation),
        direct_slot_candidates: direct_slot_candidates(&operation, &participations),
        occupancy,
    })
}

/// Lists an operation's audit trail.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor or the operation does
/// not exist.
pub fn get_operation_history(
    persistence: &mut Persistence,
    request: &OperationRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<OperationHistoryResponse, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "get_operation_history")?;

    persistence
        .get_operation(request.operation_id)
        .map_err(translate_persistence_error)?;
    let events = persistence
        .list_operation_events(request.operation_id)
        .map_err(translate_persistence_error)?;

    Ok(OperationHistoryResponse {
        operation_id: request.operation_id,
        events,
    })
}

/// Lists a participation's audit trail and justifications.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor or the participation
/// does not exist.
pub fn get_participation_history(
    persistence: &mut Persistence,
    participation_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ParticipationHistoryResponse, ApiError> {
    AuthorizationService::authorize_supervisor(
        authenticated_actor,
        "get_participation_history",
    )?;

    load_participation(persistence, participation_id)?;
    let events = persistence
        .list_participation_events(participation_id)
        .map_err(translate_persistence_error)?;
    let justifications = persistence
        .list_justifications(participation_id)
        .map_err(translate_persistence_error)?;

    Ok(ParticipationHistoryResponse {
        participation_id,
        events,
        justifications,
    })
}

/// Lists a member's active participations.
///
/// # Errors
///
/// Returns an error if a member asks about someone else or the member does
/// not exist.
pub fn list_member_participations(
    persistence: &mut Persistence,
    member_id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<MemberParticipationsResponse, ApiError> {
    AuthorizationService::authorize_self_or_supervisor(
        authenticated_actor,
        member_id,
        "list_member_participations",
    )?;

    persistence
        .get_member(member_id)
        .map_err(translate_persistence_error)?;
    let participations = persistence
        .list_member_participations(member_id)
        .map_err(translate_persistence_error)?;

    Ok(MemberParticipationsResponse {
        member_id,
        participations,
    })
}

// ============================================================================
// Roster
// ============================================================================

/// Validates a roster command against the rows it reads and persists it.
fn run_roster(
    persistence: &mut Persistence,
    command: RosterCommand,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<RosterRecord, ApiError> {
    let context: RosterContext = persistence
        .load_roster_context(&command)
        .map_err(translate_persistence_error)?;
    let change: RosterChange =
        apply_roster(&context, command, actor, now).map_err(translate_core_error)?;
    persistence
        .execute_roster_change(&change, actor, now)
        .map_err(translate_persistence_error)
}

fn unexpected_record(record: &RosterRecord) -> ApiError {
    ApiError::Internal {
        message: format!("Roster change produced an unexpected record: {record:?}"),
    }
}

fn operation_record(record: RosterRecord) -> Result<OperationInfo, ApiError> {
    match record {
        RosterRecord::Operation(operation) => Ok(OperationInfo::from(&operation)),
        other => Err(unexpected_record(&other)),
    }
}

fn member_record(record: RosterRecord) -> Result<MemberInfo, ApiError> {
    match record {
        RosterRecord::Member(member) => Ok(MemberInfo::from(&member)),
        other => Err(unexpected_record(&other)),
    }
}

/// Creates a scheduling window.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, a modality is unknown,
/// or the window is invalid.
pub fn create_window(
    persistence: &mut Persistence,
    request: &CreateWindowRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<WindowInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "create_window")?;

    let modalities: Vec<Modality> = request
        .modalities
        .iter()
        .map(String::as_str)
        .map(str::parse::<Modality>)
        .collect::<Result<_, _>>()
        .map_err(translate_domain_error)?;
    let command: RosterCommand = RosterCommand::CreateWindow {
        start: request.start,
        end: request.end,
        modalities,
        daily_operation_limit: request.daily_operation_limit,
    };

    match run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )? {
        RosterRecord::Window(window) => {
            info!(window_id = window.window_id(), "Created window");
            Ok(WindowInfo::from(&window))
        }
        other => Err(unexpected_record(&other)),
    }
}

/// Creates an operation inside a window.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the window is missing
/// or inactive, or the date, modality or daily cap rules are violated.
pub fn create_operation(
    persistence: &mut Persistence,
    request: &CreateOperationRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OperationInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "create_operation")?;

    let modality: Modality = request
        .modality
        .parse()
        .map_err(translate_domain_error)?;
    let kind: OperationKind = request.kind.parse().map_err(translate_domain_error)?;
    let command: RosterCommand = RosterCommand::CreateOperation {
        window_id: request.window_id,
        date: request.date,
        modality,
        kind,
        capacity: request.capacity,
    };

    let info: OperationInfo = operation_record(run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )?)?;
    info!(
        operation_id = info.operation_id,
        window_id = info.window_id,
        "Created operation"
    );
    Ok(info)
}

/// Moves an operation to another status.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, the status is unknown,
/// or the transition is not allowed.
pub fn set_operation_status(
    persistence: &mut Persistence,
    request: &SetOperationStatusRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OperationInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "set_operation_status")?;

    let status: OperationStatus = request.status.parse().map_err(translate_domain_error)?;
    let command: RosterCommand = RosterCommand::SetOperationStatus {
        operation_id: request.operation_id,
        status,
    };
    operation_record(run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )?)
}

/// Soft-deletes an operation.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor or the operation is
/// missing or already inactive.
pub fn deactivate_operation(
    persistence: &mut Persistence,
    request: &OperationRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<OperationInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "deactivate_operation")?;

    let command: RosterCommand = RosterCommand::DeactivateOperation {
        operation_id: request.operation_id,
    };
    operation_record(run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )?)
}

/// Registers a member.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor, or the name or role
/// is invalid.
pub fn register_member(
    persistence: &mut Persistence,
    request: &RegisterMemberRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<MemberInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "register_member")?;

    let role: MemberRole = request.role.parse().map_err(translate_domain_error)?;
    let command: RosterCommand = RosterCommand::RegisterMember {
        name: request.name.clone(),
        role,
    };
    let info: MemberInfo = member_record(run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )?)?;
    info!(member_id = info.member_id, role = info.role.as_str(), "Registered member");
    Ok(info)
}

/// Registers the first supervisor of an empty roster.
///
/// # Errors
///
/// Returns an error if any member already exists or the name is invalid.
pub fn bootstrap_supervisor(
    persistence: &mut Persistence,
    name: &str,
    now: OffsetDateTime,
) -> Result<MemberInfo, ApiError> {
    let existing: Vec<Member> = persistence
        .list_members()
        .map_err(translate_persistence_error)?;
    if !existing.is_empty() {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("bootstrap"),
            message: String::from("The roster already has members"),
        });
    }

    let command: RosterCommand = RosterCommand::RegisterMember {
        name: name.to_string(),
        role: MemberRole::Supervisor,
    };
    // Member inserts write no audit event, so the placeholder actor is never stored.
    let system: Actor = Actor::new(0, MemberRole::Supervisor);
    let info: MemberInfo = member_record(run_roster(persistence, command, system, now)?)?;
    info!(member_id = info.member_id, "Bootstrapped first supervisor");
    Ok(info)
}

/// Activates or deactivates a member.
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor or the member does not
/// exist.
pub fn set_member_active(
    persistence: &mut Persistence,
    request: &SetMemberActiveRequest,
    authenticated_actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<MemberInfo, ApiError> {
    AuthorizationService::authorize_supervisor(authenticated_actor, "set_member_active")?;

    let command: RosterCommand = RosterCommand::SetMemberActive {
        member_id: request.member_id,
        active: request.active,
    };
    member_record(run_roster(
        persistence,
        command,
        authenticated_actor.to_audit_actor(),
        now,
    )?)
}

/// Lists every member in registration order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_members(persistence: &mut Persistence) -> Result<ListMembersResponse, ApiError> {
    let members: Vec<Member> = persistence
        .list_members()
        .map_err(translate_persistence_error)?;
    Ok(ListMembersResponse {
        members: members.iter().map(MemberInfo::from).collect(),
    })
}

/// Lists a window's active operations by date.
///
/// # Errors
///
/// Returns an error if the window does not exist.
pub fn list_window_operations(
    persistence: &mut Persistence,
    window_id: i64,
) -> Result<ListOperationsResponse, ApiError> {
    persistence
        .get_window(window_id)
        .map_err(translate_persistence_error)?;
    let operations: Vec<Operation> = persistence
        .list_window_operations(window_id)
        .map_err(translate_persistence_error)?;
    Ok(ListOperationsResponse {
        window_id,
        operations: operations.iter().map(OperationInfo::from).collect(),
    })
}
