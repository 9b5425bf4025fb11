// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use muster_domain::{MemberRole, Modality, OperationKind, OperationStatus, Strategy};
use time::Date;

/// How an approval was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    /// A supervisor picked this participation.
    Individual,
    /// Part of a bulk direct-slot approval, which serves the earliest
    /// requests first and never needs a FIFO justification.
    Bulk,
}

/// A command represents member or supervisor intent as data only.
///
/// Commands are the only way to request participation state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a join request using the strategy chosen by the first
    /// admission pass.
    Join {
        operation_id: i64,
        member_id: i64,
        /// The strategy decided against the earlier read.
        planned: Strategy,
    },
    /// Withdraw a participation.
    Cancel {
        participation_id: i64,
        reason: Option<String>,
    },
    /// Confirm a waiting participation.
    Approve {
        participation_id: i64,
        /// Required when the approval skips an earlier request.
        justification: Option<String>,
        mode: ApprovalMode,
    },
    /// Decline a waiting participation.
    Reject {
        participation_id: i64,
        reason: Option<String>,
    },
    /// Place a member directly, bypassing capacity.
    AddDirect {
        operation_id: i64,
        member_id: i64,
        justification: Option<String>,
    },
    /// Renumber the queue from request order.
    ReorganizeQueue { operation_id: i64 },
}

impl Command {
    /// The operation a participation command is aimed at, when the command
    /// names it directly.
    #[must_use]
    pub const fn operation_id(&self) -> Option<i64> {
        match self {
            Self::Join { operation_id, .. }
            | Self::AddDirect { operation_id, .. }
            | Self::ReorganizeQueue { operation_id } => Some(*operation_id),
            Self::Cancel { .. } | Self::Approve { .. } | Self::Reject { .. } => None,
        }
    }

    /// Whether only supervisors may issue this command.
    #[must_use]
    pub const fn requires_supervisor(&self) -> bool {
        !matches!(self, Self::Join { .. } | Self::Cancel { .. })
    }
}

/// Supervisor commands that shape windows, operations and the member roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterCommand {
    CreateWindow {
        start: Date,
        end: Date,
        modalities: Vec<Modality>,
        daily_operation_limit: u32,
    },
    CreateOperation {
        window_id: i64,
        date: Date,
        modality: Modality,
        kind: OperationKind,
        capacity: u32,
    },
    SetOperationStatus {
        operation_id: i64,
        status: OperationStatus,
    },
    DeactivateOperation {
        operation_id: i64,
    },
    RegisterMember {
        name: String,
        role: MemberRole,
    },
    SetMemberActive {
        member_id: i64,
        active: bool,
    },
}
