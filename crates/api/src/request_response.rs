// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster::{Outcome, TransitionResult};
use muster_audit::{AuditEvent, Justification};
use muster_domain::{
    Member, MemberRole, Modality, Occupancy, Operation, OperationKind, OperationStatus,
    ParticipationState, PerDiemSequence, QuotaFigures, QuotaStatus, Rejection, Window,
};
use muster_persistence::MemberParticipation;
use time::Date;

use crate::error::ApiError;

// ============================================================================
// Participation commands
// ============================================================================

/// API request to join an operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JoinRequest {
    pub operation_id: i64,
    /// The member joining. Members may only join for themselves.
    pub member_id: i64,
}

/// Identifies the participation a cancellation withdraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum CancelTarget {
    /// A participation named by id.
    Participation { participation_id: i64 },
    /// The active participation of a member in an operation.
    Member { operation_id: i64, member_id: i64 },
}

/// API request to withdraw a participation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CancelRequest {
    #[serde(flatten)]
    pub target: CancelTarget,
    /// Optional free-text reason, kept in the audit trail.
    #[serde(default)]
    pub reason: Option<String>,
}

/// API request to confirm a waiting participation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApproveRequest {
    pub participation_id: i64,
    /// Required when an earlier request is still waiting.
    #[serde(default)]
    pub justification: Option<String>,
}

/// API request to decline a waiting participation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RejectRequest {
    pub participation_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// API request to place a member directly, past capacity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddDirectRequest {
    pub operation_id: i64,
    pub member_id: i64,
    /// Required when the operation is already full.
    #[serde(default)]
    pub justification: Option<String>,
}

/// API request naming only an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationRequest {
    pub operation_id: i64,
}

/// The answer to every state-changing participation command.
///
/// Business refusals arrive here with `success == false` and a stable
/// `error_code`; they are never raised as errors.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutcomeResponse {
    pub success: bool,
    /// `CONFIRM_DIRECT`, `ENQUEUE` or `REJECTED`, for join requests.
    pub strategy: Option<String>,
    /// The resulting participation state.
    pub state: Option<ParticipationState>,
    pub participation_id: Option<i64>,
    pub queue_position: Option<u32>,
    pub message: String,
    pub error_code: Option<String>,
    /// Quota figures, attached whenever they were computed.
    pub figures: Option<QuotaFigures>,
    /// Capacity figures of the operation as last read.
    pub occupancy: Option<Occupancy>,
}

impl OutcomeResponse {
    /// Builds the response for a transition result.
    ///
    /// # Arguments
    ///
    /// * `result` - The transition result
    /// * `participation_id` - The participation that was written, if any
    #[must_use]
    pub fn from_result(result: &TransitionResult, participation_id: Option<i64>) -> Self {
        match &result.outcome {
            Outcome::Applied(applied) => Self {
                success: true,
                strategy: applied.strategy.as_ref().map(|s| s.name().to_string()),
                state: applied.state,
                participation_id,
                queue_position: applied.queue_position,
                message: applied.message.clone(),
                error_code: None,
                figures: applied.figures,
                occupancy: None,
            },
            Outcome::Rejected(rejection) => Self::from_rejection(rejection),
        }
    }

    /// Builds the response for a business refusal.
    #[must_use]
    pub fn from_rejection(rejection: &Rejection) -> Self {
        Self {
            success: false,
            strategy: Some(String::from("REJECTED")),
            state: None,
            participation_id: None,
            queue_position: None,
            message: rejection.message.clone(),
            error_code: Some(rejection.code.as_str().to_string()),
            figures: rejection.quota,
            occupancy: None,
        }
    }

    /// Builds the response for an error raised while processing one item of
    /// a batch.
    #[must_use]
    pub fn from_error(error: &ApiError) -> Self {
        Self {
            success: false,
            strategy: None,
            state: None,
            participation_id: None,
            queue_position: None,
            message: error.to_string(),
            error_code: error.code().map(str::to_string),
            figures: None,
            occupancy: None,
        }
    }

    #[must_use]
    pub const fn with_occupancy(mut self, occupancy: Occupancy) -> Self {
        self.occupancy = Some(occupancy);
        self
    }
}

/// One item of a bulk direct-slot approval.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BulkApprovalItem {
    pub participation_id: i64,
    pub outcome: OutcomeResponse,
}

/// API response for a bulk direct-slot approval.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BulkApprovalResponse {
    pub operation_id: i64,
    /// Free regular slots when the batch was selected.
    pub vacancies: u32,
    /// One entry per selected participation, in request order.
    pub items: Vec<BulkApprovalItem>,
    pub approved: usize,
    pub failed: usize,
}

// ============================================================================
// Reads
// ============================================================================

/// API response for a member's place in an operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PositionResponse {
    pub operation_id: i64,
    pub member_id: i64,
    /// Absent when the member has no active participation.
    pub participation_id: Option<i64>,
    pub state: Option<ParticipationState>,
    /// 1-based place among waiting entries.
    pub position: Option<u32>,
    /// Waiting entries requested earlier.
    pub ahead: u32,
    pub message: String,
}

/// API request for a member's quota standing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuotaStatusRequest {
    pub member_id: i64,
    /// Any day inside the cycle and month of interest.
    pub date: Date,
}

/// API response for a member's quota standing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuotaStatusResponse {
    pub member_id: i64,
    pub figures: QuotaFigures,
    pub activities_remaining: u32,
    pub per_diem_remaining: f64,
    /// The consecutive-day sequences behind the monthly per-diem figure.
    pub sequences: Vec<PerDiemSequence>,
}

impl QuotaStatusResponse {
    #[must_use]
    pub fn new(member_id: i64, status: QuotaStatus) -> Self {
        Self {
            member_id,
            figures: status.figures,
            activities_remaining: status.activities_remaining,
            per_diem_remaining: status.per_diem_remaining,
            sequences: status.sequences,
        }
    }
}

/// API response summarising an operation's occupancy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationSummaryResponse {
    pub operation: OperationInfo,
    pub occupancy: Occupancy,
    pub vacancies: u32,
    pub waiting: u32,
    /// Whether the operation currently takes new participations.
    pub accepting: bool,
    /// Waiting participations that a bulk approval would confirm now.
    pub direct_slot_candidates: Vec<i64>,
}

/// An operation's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationHistoryResponse {
    pub operation_id: i64,
    /// Events in the order they occurred.
    pub events: Vec<AuditEvent>,
}

/// A participation's audit trail and the justifications recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParticipationHistoryResponse {
    pub participation_id: i64,
    pub events: Vec<AuditEvent>,
    pub justifications: Vec<Justification>,
}

/// A member's active participations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemberParticipationsResponse {
    pub member_id: i64,
    pub participations: Vec<MemberParticipation>,
}

// ============================================================================
// Roster
// ============================================================================

/// API request to create a scheduling window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateWindowRequest {
    pub start: Date,
    pub end: Date,
    /// Modality names, for example `BLITZ`.
    pub modalities: Vec<String>,
    pub daily_operation_limit: u32,
}

/// API request to create an operation inside a window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateOperationRequest {
    pub window_id: i64,
    pub date: Date,
    pub modality: String,
    /// `PLANNED` or `VOLUNTARY`.
    pub kind: String,
    pub capacity: u32,
}

/// API request to move an operation to another status.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetOperationStatusRequest {
    pub operation_id: i64,
    pub status: String,
}

/// API request to register a member.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterMemberRequest {
    pub name: String,
    /// `MEMBER` or `SUPERVISOR`.
    pub role: String,
}

/// API request to activate or deactivate a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetMemberActiveRequest {
    pub member_id: i64,
    pub active: bool,
}

/// Window details returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WindowInfo {
    pub window_id: Option<i64>,
    pub start: Date,
    pub end: Date,
    pub modalities: Vec<Modality>,
    pub daily_operation_limit: u32,
    pub active: bool,
}

impl From<&Window> for WindowInfo {
    fn from(window: &Window) -> Self {
        Self {
            window_id: window.window_id(),
            start: window.start(),
            end: window.end(),
            modalities: window.allowed_modalities().to_vec(),
            daily_operation_limit: window.daily_operation_limit(),
            active: window.is_active(),
        }
    }
}

/// Operation details returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperationInfo {
    pub operation_id: i64,
    pub window_id: i64,
    pub date: Date,
    pub modality: Modality,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub capacity: u32,
    pub active: bool,
}

impl From<&Operation> for OperationInfo {
    fn from(operation: &Operation) -> Self {
        Self {
            operation_id: operation.operation_id,
            window_id: operation.window_id,
            date: operation.date,
            modality: operation.modality,
            kind: operation.kind,
            status: operation.status,
            capacity: operation.capacity,
            active: operation.active,
        }
    }
}

/// Member details returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemberInfo {
    pub member_id: i64,
    pub name: String,
    pub role: MemberRole,
    pub active: bool,
}

impl From<&Member> for MemberInfo {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.member_id,
            name: member.name.clone(),
            role: member.role,
            active: member.active,
        }
    }
}

/// API response for the member roster.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListMembersResponse {
    pub members: Vec<MemberInfo>,
}

/// API response for a window's active operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListOperationsResponse {
    pub window_id: i64,
    pub operations: Vec<OperationInfo>,
}
