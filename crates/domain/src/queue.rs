// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Queue ordering and renumbering plans.
//!
//! FIFO order is defined by `requested_at`, ties broken by participation id.
//! `queue_position` is a projection of that order over active queued rows
//! and is rewritten whenever a queued row leaves the queue.

use crate::admission::Occupancy;
use crate::types::{Operation, Participation, ParticipationState};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single queue position rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChange {
    pub participation_id: i64,
    pub from: Option<u32>,
    pub to: u32,
}

/// Where a member stands in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub participation_id: i64,
    pub state: ParticipationState,
    /// 1-based rank among waiting entries; `None` once a slot is held.
    pub position: Option<u32>,
    /// Waiting entries requested earlier than this one.
    pub ahead: u32,
}

fn fifo_order(a: &Participation, b: &Participation) -> Ordering {
    a.requested_at
        .cmp(&b.requested_at)
        .then(a.participation_id.cmp(&b.participation_id))
}

/// Active pending and queued participations, earliest request first.
#[must_use]
pub fn waiting_in_order(participations: &[Participation]) -> Vec<&Participation> {
    let mut waiting: Vec<&Participation> =
        participations.iter().filter(|p| p.is_waiting()).collect();
    waiting.sort_by(|a, b| fifo_order(a, b));
    waiting
}

/// The earliest waiting participation, if any.
#[must_use]
pub fn earliest_waiting(participations: &[Participation]) -> Option<&Participation> {
    participations
        .iter()
        .filter(|p| p.is_waiting())
        .min_by(|a, b| fifo_order(a, b))
}

/// Position assigned to a participation entering the numbered queue.
#[must_use]
pub fn next_queue_position(participations: &[Participation]) -> u32 {
    let queued: usize = participations.iter().filter(|p| p.is_queued()).count();
    u32::try_from(queued).map_or(u32::MAX, |n| n.saturating_add(1))
}

/// Plans the shift that closes the gap left by `removed`.
///
/// Every other active queued participation behind `removed` moves up by
/// one. Entries ahead of it keep their position. Returns an empty plan when
/// `removed` was not in the numbered queue.
#[must_use]
pub fn compaction_after_removal(
    participations: &[Participation],
    removed: &Participation,
) -> Vec<PositionChange> {
    let Some(removed_position) = removed.queue_position.filter(|_| removed.is_queued()) else {
        return Vec::new();
    };

    let mut behind: Vec<&Participation> = participations
        .iter()
        .filter(|p| p.is_queued() && p.participation_id != removed.participation_id)
        .filter(|p| p.queue_position.is_some_and(|pos| pos > removed_position))
        .collect();
    behind.sort_by_key(|p| p.queue_position);

    behind
        .into_iter()
        .filter_map(|p| {
            p.queue_position.map(|pos| PositionChange {
                participation_id: p.participation_id,
                from: Some(pos),
                to: pos - 1,
            })
        })
        .collect()
}

/// Plans a full renumbering of the queue as 1..N in FIFO order.
///
/// Only rows whose position actually changes appear in the plan, so an
/// already-consistent queue yields an empty plan.
#[must_use]
pub fn renumber(participations: &[Participation]) -> Vec<PositionChange> {
    let mut queued: Vec<&Participation> =
        participations.iter().filter(|p| p.is_queued()).collect();
    queued.sort_by(|a, b| fifo_order(a, b));

    queued
        .into_iter()
        .zip(1_u32..)
        .filter(|(p, position)| p.queue_position != Some(*position))
        .map(|(p, position)| PositionChange {
            participation_id: p.participation_id,
            from: p.queue_position,
            to: position,
        })
        .collect()
}

/// Returns whether active queued positions form exactly 1..N.
#[must_use]
pub fn positions_are_contiguous(participations: &[Participation]) -> bool {
    let mut positions: Vec<Option<u32>> = participations
        .iter()
        .filter(|p| p.is_queued())
        .map(|p| p.queue_position)
        .collect();
    positions.sort_unstable();
    positions
        .into_iter()
        .zip(1_u32..)
        .all(|(position, expected)| position == Some(expected))
}

/// Locates the active participation of `member_id`.
///
/// Queued entries report their stored position. Pending entries, which are
/// unnumbered, report their rank among all waiting entries.
#[must_use]
pub fn standing_of(participations: &[Participation], member_id: i64) -> Option<Standing> {
    let own: &Participation = participations
        .iter()
        .find(|p| p.active && p.member_id == member_id)?;

    if own.state.holds_slot() {
        return Some(Standing {
            participation_id: own.participation_id,
            state: own.state,
            position: None,
            ahead: 0,
        });
    }

    let waiting: Vec<&Participation> = waiting_in_order(participations);
    let rank: usize = waiting
        .iter()
        .position(|p| p.participation_id == own.participation_id)?;
    let ahead: u32 = u32::try_from(rank).unwrap_or(u32::MAX);
    let position: u32 = match own.state {
        ParticipationState::Queued => own.queue_position.unwrap_or(ahead + 1),
        _ => ahead + 1,
    };

    Some(Standing {
        participation_id: own.participation_id,
        state: own.state,
        position: Some(position),
        ahead,
    })
}

/// Picks the waiting participations that fit in the free regular slots.
///
/// Earliest requests win. The result is empty when the operation is full.
#[must_use]
pub fn direct_slot_candidates(operation: &Operation, participations: &[Participation]) -> Vec<i64> {
    let vacancies: usize =
        usize::try_from(Occupancy::of(operation, participations).remaining()).unwrap_or(0);
    waiting_in_order(participations)
        .into_iter()
        .filter(|p| p.operation_id == operation.operation_id)
        .take(vacancies)
        .map(|p| p.participation_id)
        .collect()
}
