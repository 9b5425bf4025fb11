// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{ApiFixture, at, now, setup};
use crate::{
    AddDirectRequest, ApiError, ApproveRequest, AuthError, AuthenticatedActor,
    AuthenticationService, CancelRequest, CancelTarget, JoinRequest, QuotaStatusRequest,
    RegisterMemberRequest, Role, SetMemberActiveRequest, add_direct, approve,
    bootstrap_supervisor, cancel, get_position, get_quota_status, join, register_member,
    set_member_active,
};

fn assert_denied(error: &ApiError) {
    assert!(matches!(error, ApiError::Unauthorized { .. }), "{error:?}");
    assert_eq!(error.code(), Some("PERMISSAO_NEGADA"));
}

#[test]
fn test_authenticated_role_comes_from_stored_member() {
    let mut fixture: ApiFixture = setup(1, 1);

    let supervisor: AuthenticatedActor =
        AuthenticationService::authenticate(&mut fixture.persistence, fixture.supervisor.member_id)
            .unwrap();
    let member_id: i64 = fixture.member_id(0);
    let member: AuthenticatedActor =
        AuthenticationService::authenticate(&mut fixture.persistence, member_id).unwrap();

    assert_eq!(supervisor.role, Role::Supervisor);
    assert_eq!(member.role, Role::Member);
}

#[test]
fn test_unknown_member_cannot_authenticate() {
    let mut fixture: ApiFixture = setup(1, 0);

    let error: AuthError =
        AuthenticationService::authenticate(&mut fixture.persistence, 999).unwrap_err();

    assert!(matches!(error, AuthError::AuthenticationFailed { .. }));
}

#[test]
fn test_inactive_member_cannot_authenticate() {
    let mut fixture: ApiFixture = setup(1, 1);
    let member_id: i64 = fixture.member_id(0);
    set_member_active(
        &mut fixture.persistence,
        &SetMemberActiveRequest {
            member_id,
            active: false,
        },
        &fixture.supervisor,
        now(),
    )
    .unwrap();

    let error: AuthError =
        AuthenticationService::authenticate(&mut fixture.persistence, member_id).unwrap_err();

    assert!(matches!(error, AuthError::AuthenticationFailed { .. }));
}

#[test]
fn test_member_cannot_join_for_someone_else() {
    let mut fixture: ApiFixture = setup(2, 2);
    let actor: AuthenticatedActor = fixture.members[0];

    let error: ApiError = join(
        &mut fixture.persistence,
        &fixture.policy,
        &JoinRequest {
            operation_id: fixture.operation_id,
            member_id: fixture.members[1].member_id,
        },
        &actor,
        at(1),
    )
    .unwrap_err();

    assert_denied(&error);
}

#[test]
fn test_supervisor_may_join_on_behalf_of_member() {
    let mut fixture: ApiFixture = setup(2, 1);
    let member_id: i64 = fixture.member_id(0);

    let outcome = join(
        &mut fixture.persistence,
        &fixture.policy,
        &JoinRequest {
            operation_id: fixture.operation_id,
            member_id,
        },
        &fixture.supervisor,
        at(1),
    )
    .unwrap();

    assert!(outcome.success);
}

#[test]
fn test_member_cannot_cancel_someone_elses_participation() {
    let mut fixture: ApiFixture = setup(2, 2);
    let participation_id: i64 = fixture.joined(0, 1);
    let intruder: AuthenticatedActor = fixture.members[1];

    let error: ApiError = cancel(
        &mut fixture.persistence,
        &fixture.policy,
        &CancelRequest {
            target: CancelTarget::Participation { participation_id },
            reason: None,
        },
        &intruder,
        at(2),
    )
    .unwrap_err();

    assert_denied(&error);
}

#[test]
fn test_member_cannot_approve_or_add_directly() {
    let mut fixture: ApiFixture = setup(1, 2);
    fixture.joined(0, 1);
    let waiting: i64 = fixture.joined(1, 2);
    let actor: AuthenticatedActor = fixture.members[1];

    let approval: ApiError = approve(
        &mut fixture.persistence,
        &fixture.policy,
        &ApproveRequest {
            participation_id: waiting,
            justification: None,
        },
        &actor,
        at(3),
    )
    .unwrap_err();
    assert_denied(&approval);

    let direct: ApiError = add_direct(
        &mut fixture.persistence,
        &fixture.policy,
        &AddDirectRequest {
            operation_id: fixture.operation_id,
            member_id: actor.member_id,
            justification: None,
        },
        &actor,
        at(3),
    )
    .unwrap_err();
    assert_denied(&direct);
}

#[test]
fn test_member_cannot_manage_roster() {
    let mut fixture: ApiFixture = setup(1, 1);
    let actor: AuthenticatedActor = fixture.members[0];

    let error: ApiError = register_member(
        &mut fixture.persistence,
        &RegisterMemberRequest {
            name: String::from("Intruder"),
            role: String::from("SUPERVISOR"),
        },
        &actor,
        now(),
    )
    .unwrap_err();

    assert_denied(&error);
}

#[test]
fn test_member_reads_only_their_own_standing() {
    let mut fixture: ApiFixture = setup(1, 2);
    let actor: AuthenticatedActor = fixture.members[0];
    let other: i64 = fixture.member_id(1);

    let position: ApiError =
        get_position(&mut fixture.persistence, fixture.operation_id, other, &actor).unwrap_err();
    assert_denied(&position);

    let quota: ApiError = get_quota_status(
        &mut fixture.persistence,
        &fixture.policy,
        &QuotaStatusRequest {
            member_id: other,
            date: super::helpers::operation_date(),
        },
        &actor,
    )
    .unwrap_err();
    assert_denied(&quota);
}

#[test]
fn test_bootstrap_only_on_empty_roster() {
    let mut fixture: ApiFixture = setup(1, 0);

    let error: ApiError =
        bootstrap_supervisor(&mut fixture.persistence, "Second", now()).unwrap_err();

    assert!(matches!(error, ApiError::DomainRuleViolation { .. }));
}
