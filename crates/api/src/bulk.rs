// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk direct-slot approval.
//!
//! The earliest waiting requests that fit the free regular slots are each
//! approved as an independent command. One failing item never blocks the
//! others, and every item is reported.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use muster::ApprovalMode;
use muster_domain::{Occupancy, Operation, Participation, SchedulingPolicy, direct_slot_candidates};
use muster_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::{ApiError, translate_persistence_error};
use crate::handlers::approve_participation;
use crate::request_response::{
    BulkApprovalItem, BulkApprovalResponse, OperationRequest, OutcomeResponse,
};

/// Limits applied while approving a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BulkApprovalConfig {
    /// Approvals in flight at once.
    pub max_concurrency: usize,
    /// Delay added per item, in selection order, before it starts.
    pub stagger: Duration,
}

impl Default for BulkApprovalConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            stagger: Duration::from_millis(100),
        }
    }
}

/// Approves the earliest waiting participations that fit the free slots.
///
/// Vacancies are counted once, when the batch is selected. Each item then
/// runs as its own command against a fresh read, so an item whose slot was
/// taken in the meantime is reported as a failure instead of overfilling the
/// operation.
///
/// # Arguments
///
/// * `persistence` - The shared persistence layer
/// * `policy` - The scheduling policy
/// * `request` - The operation to fill
/// * `authenticated_actor` - The authenticated actor making this request
/// * `config` - Concurrency and stagger limits
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if the actor is not a supervisor or the operation does
/// not exist. Per-item failures are reported in the response.
pub async fn bulk_approve_direct_slots(
    persistence: Arc<Mutex<Persistence>>,
    policy: &SchedulingPolicy,
    request: &OperationRequest,
    authenticated_actor: &AuthenticatedActor,
    config: BulkApprovalConfig,
    now: OffsetDateTime,
) -> Result<BulkApprovalResponse, ApiError> {
    AuthorizationService::authorize_supervisor(
        authenticated_actor,
        "bulk_approve_direct_slots",
    )?;

    let (vacancies, candidates): (u32, Vec<i64>) = {
        let mut guard = persistence.lock().await;
        let operation: Operation = guard
            .get_operation(request.operation_id)
            .map_err(translate_persistence_error)?;
        let participations: Vec<Participation> = guard
            .list_operation_participations(request.operation_id)
            .map_err(translate_persistence_error)?;
        (
            Occupancy::of(&operation, &participations).remaining(),
            direct_slot_candidates(&operation, &participations),
        )
    };
    info!(
        operation_id = request.operation_id,
        vacancies,
        selected = candidates.len(),
        "Starting bulk approval"
    );

    let mut items: Vec<(usize, BulkApprovalItem)> = stream::iter(candidates.into_iter().enumerate())
        .map(|(index, participation_id)| {
            let persistence: Arc<Mutex<Persistence>> = Arc::clone(&persistence);
            async move {
                let delay: Duration = config
                    .stagger
                    .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let mut guard = persistence.lock().await;
                let outcome: OutcomeResponse = approve_participation(
                    &mut guard,
                    policy,
                    participation_id,
                    None,
                    ApprovalMode::Bulk,
                    authenticated_actor,
                    now,
                )
                .unwrap_or_else(|e| {
                    warn!(participation_id, error = %e, "Bulk approval item failed");
                    OutcomeResponse::from_error(&e)
                });
                (
                    index,
                    BulkApprovalItem {
                        participation_id,
                        outcome,
                    },
                )
            }
        })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;
    items.sort_by_key(|(index, _)| *index);

    let items: Vec<BulkApprovalItem> = items.into_iter().map(|(_, item)| item).collect();
    let approved: usize = items.iter().filter(|item| item.outcome.success).count();
    let failed: usize = items.len() - approved;
    info!(
        operation_id = request.operation_id,
        approved, failed, "Finished bulk approval"
    );

    Ok(BulkApprovalResponse {
        operation_id: request.operation_id,
        vacancies,
        items,
        approved,
        failed,
    })
}
