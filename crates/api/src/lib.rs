// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Calling layer of the Muster scheduler.
//!
//! Handlers authorize the actor, read fresh state through the persistence
//! layer, apply commands through the core and translate every lower-layer
//! error explicitly. Business refusals travel as unsuccessful
//! `OutcomeResponse` values with a stable error code.

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

mod auth;
mod bulk;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use bulk::{BulkApprovalConfig, bulk_approve_direct_slots};
pub use error::{
    ApiError, AuthError, Resource, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    add_direct, approve, bootstrap_supervisor, cancel, create_operation, create_window,
    deactivate_operation, get_operation_history, get_operation_summary,
    get_participation_history, get_position, get_quota_status, join, list_member_participations,
    list_members, list_window_operations, register_member, reject, reorganize_queue,
    set_member_active, set_operation_status,
};
pub use request_response::{
    AddDirectRequest, ApproveRequest, BulkApprovalItem, BulkApprovalResponse, CancelRequest,
    CancelTarget, CreateOperationRequest, CreateWindowRequest, JoinRequest, ListMembersResponse,
    ListOperationsResponse, MemberInfo, MemberParticipationsResponse, OperationHistoryResponse,
    OperationInfo, OperationRequest, OperationSummaryResponse, OutcomeResponse,
    ParticipationHistoryResponse, PositionResponse, QuotaStatusRequest, QuotaStatusResponse,
    RegisterMemberRequest, RejectRequest, SetMemberActiveRequest, SetOperationStatusRequest,
    WindowInfo,
};
