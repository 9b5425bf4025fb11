// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP endpoints.
//!
//! Every handler is a thin adapter: authenticate the caller, lock the
//! persistence adapter, call the matching `muster_api` operation with the
//! current time, and serialize the result. Business rejections come back
//! as `200` with `success: false`; only boundary errors map to non-2xx.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use muster_api::{
    AddDirectRequest, ApiError, ApproveRequest, BulkApprovalResponse, CancelRequest,
    CreateOperationRequest, CreateWindowRequest, JoinRequest, ListMembersResponse,
    ListOperationsResponse, MemberInfo, MemberParticipationsResponse, OperationHistoryResponse,
    OperationInfo, OperationRequest, OperationSummaryResponse, OutcomeResponse,
    ParticipationHistoryResponse, PositionResponse, QuotaStatusRequest, QuotaStatusResponse,
    RegisterMemberRequest, RejectRequest, SetMemberActiveRequest, SetOperationStatusRequest,
    WindowInfo, add_direct, approve, bootstrap_supervisor, bulk_approve_direct_slots, cancel,
    create_operation, create_window, deactivate_operation, get_operation_history,
    get_operation_summary, get_participation_history, get_position, get_quota_status, join,
    list_member_participations, list_members, list_window_operations, register_member, reject,
    reorganize_queue, set_member_active, set_operation_status,
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::{error, info};

use crate::AppState;
use crate::live::live_handler;
use crate::session::SessionMember;

/// Error body returned for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator.
    pub error: bool,
    /// Stable error code, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message.
    pub message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// Stable error code, when one applies.
    code: Option<&'static str>,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            code: self.code.map(str::to_string),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// API request for seeding the first supervisor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapApiRequest {
    /// Display name of the supervisor.
    pub name: String,
}

/// API request for changing an operation's status.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperationStatusApiRequest {
    /// The target status, e.g. `AWAITING_REVIEW`.
    pub status: String,
}

/// API request for activating or deactivating a member.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MemberActiveApiRequest {
    pub active: bool,
}

/// Query parameters for the quota status endpoint.
#[derive(Debug, Deserialize)]
pub struct QuotaQuery {
    /// Any date inside the cycle and month of interest.
    pub date: Date,
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Handler for POST `/bootstrap`.
///
/// Seeds the first supervisor. Only succeeds on an empty roster.
async fn handle_bootstrap(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BootstrapApiRequest>,
) -> Result<Json<MemberInfo>, HttpError> {
    info!(name = %req.name, "Handling bootstrap request");
    let mut persistence = app_state.persistence.lock().await;
    let member: MemberInfo = bootstrap_supervisor(&mut persistence, &req.name, now())?;
    Ok(Json(member))
}

// ============================================================================
// Participation commands
// ============================================================================

/// Handler for POST `/participations/join`.
async fn handle_join(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<JoinRequest>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(
        actor = actor.member_id,
        operation_id = req.operation_id,
        member_id = req.member_id,
        "Handling join request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse =
        join(&mut persistence, &app_state.policy, &req, &actor, now())?;
    Ok(Json(response))
}

/// Handler for POST `/participations/cancel`.
async fn handle_cancel(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(actor = actor.member_id, target = ?req.target, "Handling cancel request");
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse =
        cancel(&mut persistence, &app_state.policy, &req, &actor, now())?;
    Ok(Json(response))
}

/// Handler for POST `/participations/approve`.
async fn handle_approve(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(
        actor = actor.member_id,
        participation_id = req.participation_id,
        "Handling approve request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse =
        approve(&mut persistence, &app_state.policy, &req, &actor, now())?;
    Ok(Json(response))
}

/// Handler for POST `/participations/reject`.
async fn handle_reject(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<RejectRequest>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(
        actor = actor.member_id,
        participation_id = req.participation_id,
        "Handling reject request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse =
        reject(&mut persistence, &app_state.policy, &req, &actor, now())?;
    Ok(Json(response))
}

/// Handler for POST `/participations/direct`.
async fn handle_add_direct(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<AddDirectRequest>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(
        actor = actor.member_id,
        operation_id = req.operation_id,
        member_id = req.member_id,
        "Handling direct add request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse =
        add_direct(&mut persistence, &app_state.policy, &req, &actor, now())?;
    Ok(Json(response))
}

/// Handler for GET `/participations/{participation_id}/history`.
async fn handle_participation_history(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(participation_id): Path<i64>,
) -> Result<Json<ParticipationHistoryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ParticipationHistoryResponse =
        get_participation_history(&mut persistence, participation_id, &actor)?;
    Ok(Json(response))
}

// ============================================================================
// Operations
// ============================================================================

/// Handler for POST `/operations`.
async fn handle_create_operation(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<CreateOperationRequest>,
) -> Result<Json<OperationInfo>, HttpError> {
    info!(
        actor = actor.member_id,
        window_id = req.window_id,
        date = %req.date,
        modality = %req.modality,
        "Handling create_operation request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let operation: OperationInfo = create_operation(&mut persistence, &req, &actor, now())?;
    Ok(Json(operation))
}

/// Handler for GET `/operations/{operation_id}`.
async fn handle_operation_summary(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(_actor): SessionMember,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationSummaryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let summary: OperationSummaryResponse =
        get_operation_summary(&mut persistence, &OperationRequest { operation_id })?;
    Ok(Json(summary))
}

/// Handler for POST `/operations/{operation_id}/status`.
async fn handle_set_operation_status(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(operation_id): Path<i64>,
    Json(req): Json<OperationStatusApiRequest>,
) -> Result<Json<OperationInfo>, HttpError> {
    info!(
        actor = actor.member_id,
        operation_id,
        status = %req.status,
        "Handling set_operation_status request"
    );
    let request: SetOperationStatusRequest = SetOperationStatusRequest {
        operation_id,
        status: req.status,
    };
    let mut persistence = app_state.persistence.lock().await;
    let operation: OperationInfo = set_operation_status(&mut persistence, &request, &actor, now())?;
    Ok(Json(operation))
}

/// Handler for POST `/operations/{operation_id}/deactivate`.
async fn handle_deactivate_operation(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationInfo>, HttpError> {
    info!(actor = actor.member_id, operation_id, "Handling deactivate_operation request");
    let mut persistence = app_state.persistence.lock().await;
    let operation: OperationInfo =
        deactivate_operation(&mut persistence, &OperationRequest { operation_id }, &actor, now())?;
    Ok(Json(operation))
}

/// Handler for POST `/operations/{operation_id}/bulk_approve`.
///
/// Does not hold the persistence lock itself: each approval takes it in
/// turn so other requests interleave.
async fn handle_bulk_approve(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(operation_id): Path<i64>,
) -> Result<Json<BulkApprovalResponse>, HttpError> {
    info!(actor = actor.member_id, operation_id, "Handling bulk approval request");
    let response: BulkApprovalResponse = bulk_approve_direct_slots(
        Arc::clone(&app_state.persistence),
        &app_state.policy,
        &OperationRequest { operation_id },
        &actor,
        app_state.bulk,
        now(),
    )
    .await?;
    info!(
        operation_id,
        approved = response.approved,
        failed = response.failed,
        "Bulk approval finished"
    );
    Ok(Json(response))
}

/// Handler for POST `/operations/{operation_id}/reorganize`.
async fn handle_reorganize_queue(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(operation_id): Path<i64>,
) -> Result<Json<OutcomeResponse>, HttpError> {
    info!(actor = actor.member_id, operation_id, "Handling queue reorganization");
    let mut persistence = app_state.persistence.lock().await;
    let response: OutcomeResponse = reorganize_queue(
        &mut persistence,
        &app_state.policy,
        &OperationRequest { operation_id },
        &actor,
        now(),
    )?;
    Ok(Json(response))
}

/// Handler for GET `/operations/{operation_id}/history`.
async fn handle_operation_history(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(operation_id): Path<i64>,
) -> Result<Json<OperationHistoryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: OperationHistoryResponse =
        get_operation_history(&mut persistence, &OperationRequest { operation_id }, &actor)?;
    Ok(Json(response))
}

/// Handler for GET `/operations/{operation_id}/members/{member_id}/position`.
async fn handle_position(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path((operation_id, member_id)): Path<(i64, i64)>,
) -> Result<Json<PositionResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: PositionResponse =
        get_position(&mut persistence, operation_id, member_id, &actor)?;
    Ok(Json(response))
}

// ============================================================================
// Windows
// ============================================================================

/// Handler for POST `/windows`.
async fn handle_create_window(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<CreateWindowRequest>,
) -> Result<Json<WindowInfo>, HttpError> {
    info!(
        actor = actor.member_id,
        start = %req.start,
        end = %req.end,
        "Handling create_window request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let window: WindowInfo = create_window(&mut persistence, &req, &actor, now())?;
    Ok(Json(window))
}

/// Handler for GET `/windows/{window_id}/operations`.
async fn handle_list_window_operations(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(_actor): SessionMember,
    Path(window_id): Path<i64>,
) -> Result<Json<ListOperationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListOperationsResponse = list_window_operations(&mut persistence, window_id)?;
    Ok(Json(response))
}

// ============================================================================
// Members
// ============================================================================

/// Handler for GET `/members`.
async fn handle_list_members(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(_actor): SessionMember,
) -> Result<Json<ListMembersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListMembersResponse = list_members(&mut persistence)?;
    Ok(Json(response))
}

/// Handler for POST `/members`.
async fn handle_register_member(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Json(req): Json<RegisterMemberRequest>,
) -> Result<Json<MemberInfo>, HttpError> {
    info!(actor = actor.member_id, role = %req.role, "Handling register_member request");
    let mut persistence = app_state.persistence.lock().await;
    let member: MemberInfo = register_member(&mut persistence, &req, &actor, now())?;
    Ok(Json(member))
}

/// Handler for POST `/members/{member_id}/active`.
async fn handle_set_member_active(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(member_id): Path<i64>,
    Json(req): Json<MemberActiveApiRequest>,
) -> Result<Json<MemberInfo>, HttpError> {
    info!(
        actor = actor.member_id,
        member_id,
        active = req.active,
        "Handling set_member_active request"
    );
    let request: SetMemberActiveRequest = SetMemberActiveRequest {
        member_id,
        active: req.active,
    };
    let mut persistence = app_state.persistence.lock().await;
    let member: MemberInfo = set_member_active(&mut persistence, &request, &actor, now())?;
    Ok(Json(member))
}

/// Handler for GET `/members/{member_id}/quota?date=YYYY-MM-DD`.
async fn handle_quota_status(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(member_id): Path<i64>,
    Query(query): Query<QuotaQuery>,
) -> Result<Json<QuotaStatusResponse>, HttpError> {
    let request: QuotaStatusRequest = QuotaStatusRequest {
        member_id,
        date: query.date,
    };
    let mut persistence = app_state.persistence.lock().await;
    let response: QuotaStatusResponse =
        get_quota_status(&mut persistence, &app_state.policy, &request, &actor)?;
    Ok(Json(response))
}

/// Handler for GET `/members/{member_id}/participations`.
async fn handle_member_participations(
    AxumState(app_state): AxumState<AppState>,
    SessionMember(actor): SessionMember,
    Path(member_id): Path<i64>,
) -> Result<Json<MemberParticipationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: MemberParticipationsResponse =
        list_member_participations(&mut persistence, member_id, &actor)?;
    Ok(Json(response))
}

/// Builds the application router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bootstrap", post(handle_bootstrap))
        .route("/participations/join", post(handle_join))
        .route("/participations/cancel", post(handle_cancel))
        .route("/participations/approve", post(handle_approve))
        .route("/participations/reject", post(handle_reject))
        .route("/participations/direct", post(handle_add_direct))
        .route(
            "/participations/{participation_id}/history",
            get(handle_participation_history),
        )
        .route("/operations", post(handle_create_operation))
        .route("/operations/{operation_id}", get(handle_operation_summary))
        .route(
            "/operations/{operation_id}/status",
            post(handle_set_operation_status),
        )
        .route(
            "/operations/{operation_id}/deactivate",
            post(handle_deactivate_operation),
        )
        .route(
            "/operations/{operation_id}/bulk_approve",
            post(handle_bulk_approve),
        )
        .route(
            "/operations/{operation_id}/reorganize",
            post(handle_reorganize_queue),
        )
        .route(
            "/operations/{operation_id}/history",
            get(handle_operation_history),
        )
        .route(
            "/operations/{operation_id}/members/{member_id}/position",
            get(handle_position),
        )
        .route("/windows", post(handle_create_window))
        .route(
            "/windows/{window_id}/operations",
            get(handle_list_window_operations),
        )
        .route(
            "/members",
            get(handle_list_members).post(handle_register_member),
        )
        .route("/members/{member_id}/active", post(handle_set_member_active))
        .route("/members/{member_id}/quota", get(handle_quota_status))
        .route(
            "/members/{member_id}/participations",
            get(handle_member_participations),
        )
        .route("/live", get(live_handler))
        .with_state(app_state)
}
