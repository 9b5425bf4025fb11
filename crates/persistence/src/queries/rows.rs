// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel row structs and their conversion into domain values.

use diesel::prelude::*;
use muster_audit::{
    Actor, AuditEvent, Cause, EventType, Justification, JustificationContext, StateChange,
};
use muster_domain::{
    Member, MemberRole, Modality, Operation, OperationKind, OperationStatus, Participation,
    ParticipationState, Window,
};
use std::str::FromStr;

use crate::data_models::{from_db_count, from_db_flag, parse_date, parse_timestamp};
use crate::diesel_schema::{events, justifications, members, operations, participations, windows};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = windows)]
pub(crate) struct WindowRow {
    window_id: i64,
    start_date: String,
    end_date: String,
    modalities: String,
    daily_operation_limit: i32,
    active: i32,
}

impl WindowRow {
    pub(crate) fn into_window(self) -> Result<Window, PersistenceError> {
        let modalities: Vec<Modality> = self
            .modalities
            .split(',')
            .filter(|code| !code.is_empty())
            .map(Modality::from_str)
            .collect::<Result<Vec<Modality>, _>>()?;
        Ok(Window::with_id(
            self.window_id,
            parse_date(&self.start_date)?,
            parse_date(&self.end_date)?,
            modalities,
            from_db_count(self.daily_operation_limit)?,
            from_db_flag(self.active),
        ))
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = operations)]
pub(crate) struct OperationRow {
    operation_id: i64,
    window_id: i64,
    operation_date: String,
    modality: String,
    kind: String,
    status: String,
    capacity: i32,
    active: i32,
}

impl OperationRow {
    pub(crate) fn into_operation(self) -> Result<Operation, PersistenceError> {
        Ok(Operation {
            operation_id: self.operation_id,
            window_id: self.window_id,
            date: parse_date(&self.operation_date)?,
            modality: Modality::from_str(&self.modality)?,
            kind: OperationKind::from_str(&self.kind)?,
            status: OperationStatus::from_str(&self.status)?,
            capacity: from_db_count(self.capacity)?,
            active: from_db_flag(self.active),
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = members)]
pub(crate) struct MemberRow {
    member_id: i64,
    name: String,
    role: String,
    active: i32,
}

impl MemberRow {
    pub(crate) fn into_member(self) -> Result<Member, PersistenceError> {
        Ok(Member {
            member_id: self.member_id,
            name: self.name,
            role: MemberRole::from_str(&self.role)?,
            active: from_db_flag(self.active),
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = participations)]
pub(crate) struct ParticipationRow {
    participation_id: i64,
    operation_id: i64,
    member_id: i64,
    state: String,
    queue_position: Option<i32>,
    requested_at: String,
    active: i32,
    capacity_override: i32,
}

impl ParticipationRow {
    pub(crate) fn into_participation(self) -> Result<Participation, PersistenceError> {
        Ok(Participation {
            participation_id: self.participation_id,
            operation_id: self.operation_id,
            member_id: self.member_id,
            state: ParticipationState::from_str(&self.state)?,
            queue_position: self.queue_position.map(from_db_count).transpose()?,
            requested_at: parse_timestamp(&self.requested_at)?,
            active: from_db_flag(self.active),
            capacity_override: from_db_flag(self.capacity_override),
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = events)]
pub(crate) struct EventRow {
    event_id: i64,
    operation_id: i64,
    member_id: Option<i64>,
    participation_id: Option<i64>,
    event_type: String,
    actor_member_id: i64,
    actor_role: String,
    cause: Option<String>,
    from_state: Option<String>,
    to_state: Option<String>,
    details: String,
    occurred_at: String,
}

impl EventRow {
    pub(crate) fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let change: Option<StateChange> = match self.to_state {
            Some(to) => Some(StateChange {
                from: self
                    .from_state
                    .as_deref()
                    .map(ParticipationState::from_str)
                    .transpose()?,
                to: ParticipationState::from_str(&to)?,
            }),
            None => None,
        };
        Ok(AuditEvent {
            event_id: Some(self.event_id),
            operation_id: self.operation_id,
            member_id: self.member_id,
            participation_id: self.participation_id,
            event_type: EventType::from_str(&self.event_type)?,
            actor: Actor::new(self.actor_member_id, MemberRole::from_str(&self.actor_role)?),
            cause: self.cause.map(Cause::new),
            change,
            details: self.details,
            occurred_at: parse_timestamp(&self.occurred_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = justifications)]
pub(crate) struct JustificationRow {
    justification_id: i64,
    participation_id: i64,
    supervisor_id: i64,
    justification_text: String,
    context: String,
    skipped_participation_id: Option<i64>,
    recorded_at: String,
}

impl JustificationRow {
    pub(crate) fn into_justification(self) -> Result<Justification, PersistenceError> {
        Ok(Justification {
            justification_id: Some(self.justification_id),
            participation_id: Some(self.participation_id),
            supervisor_id: self.supervisor_id,
            text: self.justification_text,
            context: JustificationContext::from_str(&self.context)?,
            skipped_participation_id: self.skipped_participation_id,
            recorded_at: parse_timestamp(&self.recorded_at)?,
        })
    }
}
