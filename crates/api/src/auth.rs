// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.
//!
//! Credential checking happens outside this system. The calling layer hands
//! over a member id it already trusts; this module resolves that id to a
//! role and enforces which commands the role may issue.

use muster_audit::Actor;
use muster_domain::{Member, MemberRole};
use muster_persistence::{Persistence, PersistenceError};
use tracing::debug;

use crate::error::AuthError;

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Member role: may request and withdraw their own participations.
    Member,
    /// Supervisor role: members with roster and queue authority.
    ///
    /// Supervisors may:
    /// - create windows and operations and change operation status
    /// - register members and toggle their active flag
    /// - approve or reject waiting participations, out of order when justified
    /// - add members directly, past capacity
    /// - act on behalf of any member
    Supervisor,
}

impl From<MemberRole> for Role {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Member => Self::Member,
            MemberRole::Supervisor => Self::Supervisor,
        }
    }
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The member acting.
    pub member_id: i64,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `member_id` - The member acting
    /// * `role` - The role assigned to this actor
    #[must_use]
    pub const fn new(member_id: i64, role: Role) -> Self {
        Self { member_id, role }
    }

    /// Converts this authenticated actor into an audit Actor.
    #[must_use]
    pub const fn to_audit_actor(&self) -> Actor {
        let role: MemberRole = match self.role {
            Role::Member => MemberRole::Member,
            Role::Supervisor => MemberRole::Supervisor,
        };
        Actor::new(self.member_id, role)
    }

    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        matches!(self.role, Role::Supervisor)
    }
}

/// Resolves trusted member ids into authenticated actors.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Authenticates a member by id.
    ///
    /// The role is taken from the stored member, never from the caller.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `member_id` - The member id presented by the calling layer
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not exist or is inactive.
    pub fn authenticate(
        persistence: &mut Persistence,
        member_id: i64,
    ) -> Result<AuthenticatedActor, AuthError> {
        let member: Member = persistence.get_member(member_id).map_err(|e| match e {
            PersistenceError::MemberNotFound(_) => AuthError::AuthenticationFailed {
                reason: format!("Unknown member {member_id}"),
            },
            other => AuthError::AuthenticationFailed {
                reason: other.to_string(),
            },
        })?;

        if !member.active {
            return Err(AuthError::AuthenticationFailed {
                reason: format!("Member {member_id} is inactive"),
            });
        }

        debug!(member_id, role = member.role.as_str(), "Authenticated member");
        Ok(AuthenticatedActor::new(member_id, Role::from(member.role)))
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the actor is a supervisor.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `action` - The action attempted, for the error message
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Supervisor role.
    pub fn authorize_supervisor(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Supervisor => Ok(()),
            Role::Member => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Supervisor"),
            }),
        }
    }

    /// Checks that the actor acts for themself, or is a supervisor.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `member_id` - The member the action is about
    /// * `action` - The action attempted, for the error message
    ///
    /// # Errors
    ///
    /// Returns an error if a member acts on behalf of someone else.
    pub fn authorize_self_or_supervisor(
        actor: &AuthenticatedActor,
        member_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        if actor.member_id == member_id || actor.is_supervisor() {
            return Ok(());
        }
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("Supervisor"),
        })
    }
}
