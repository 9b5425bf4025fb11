// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row-level change notifications.
//!
//! Every committed write produces one notification per touched row. They are
//! handed to the registered [`ChangeSink`] only after the transaction
//! commits, so subscribers never observe rolled-back rows.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The table a change landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Participations,
    Operations,
    Events,
    Justifications,
}

/// The class of a row change.
///
/// Soft deactivations are reported as `Delete`: for watchers the row is
/// gone even though it stays on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed row change, resolved to its operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    pub operation_id: i64,
    pub row_id: i64,
    pub at: OffsetDateTime,
}

impl ChangeNotification {
    #[must_use]
    pub const fn new(
        table: ChangeTable,
        kind: ChangeKind,
        operation_id: i64,
        row_id: i64,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            table,
            kind,
            operation_id,
            row_id,
            at,
        }
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self.kind, ChangeKind::Delete)
    }
}

/// Receives committed change notifications.
///
/// Implementations must not block; publishing happens while the caller
/// still holds the persistence handle.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, change: &ChangeNotification);
}
