// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::http::StatusCode;
use muster_persistence::{ChangeNotification, ChangeTable};
use serde_json::{Value, json};
use tokio::sync::broadcast;

use super::helpers::{TestServer, days_from_today};

#[tokio::test]
async fn test_bootstrap_only_once() {
    let server: TestServer = TestServer::new();
    server.bootstrap().await;

    let (status, body) = server
        .call("POST", "/bootstrap", None, Some(json!({ "name": "Usurper" })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!(true));
}

#[tokio::test]
async fn test_requests_without_member_header_are_unauthorized() {
    let server: TestServer = TestServer::new();
    server.bootstrap().await;

    let (status, _) = server.call("GET", "/members", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_member_is_unauthorized() {
    let server: TestServer = TestServer::new();
    server.bootstrap().await;

    let (status, _) = server.call("GET", "/members", Some(999), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_cannot_register_members() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let member: i64 = server.register(supervisor, "Ana").await;

    let (status, body) = server
        .call(
            "POST",
            "/members",
            Some(member),
            Some(json!({ "name": "Intruder", "role": "SUPERVISOR" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("PERMISSAO_NEGADA"));
}

#[tokio::test]
async fn test_join_confirms_then_enqueues() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let first: i64 = server.register(supervisor, "Ana").await;
    let second: i64 = server.register(supervisor, "Bruno").await;
    let operation_id: i64 = server.open_operation(supervisor, 1).await;

    let confirmed: Value = server.join(operation_id, first).await;
    let queued: Value = server.join(operation_id, second).await;

    assert_eq!(confirmed["success"], json!(true));
    assert_eq!(confirmed["strategy"], json!("CONFIRM_DIRECT"));
    assert_eq!(queued["strategy"], json!("ENQUEUE"));
    assert_eq!(queued["state"], json!("QUEUED"));
    assert_eq!(queued["queue_position"], json!(1));

    let (status, position) = server
        .call(
            "GET",
            &format!("/operations/{operation_id}/members/{second}/position"),
            Some(second),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(position["position"], json!(1));
    assert_eq!(position["ahead"], json!(0));
}

#[tokio::test]
async fn test_business_rejection_is_a_successful_response() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let member: i64 = server.register(supervisor, "Ana").await;
    let operation_id: i64 = server.open_operation(supervisor, 2).await;
    server.join(operation_id, member).await;

    let duplicate: Value = server.join(operation_id, member).await;

    assert_eq!(duplicate["success"], json!(false));
    assert_eq!(duplicate["error_code"], json!("PARTICIPACAO_DUPLICADA"));
}

#[tokio::test]
async fn test_missing_operation_is_not_found() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;

    let (status, body) = server
        .call("GET", "/operations/4242", Some(supervisor), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("OPERACAO_NAO_ENCONTRADA"));
}

#[tokio::test]
async fn test_cancel_then_bulk_approve_fills_freed_slots() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let mut members: Vec<i64> = Vec::new();
    for name in ["Ana", "Bruno", "Carla", "Davi"] {
        members.push(server.register(supervisor, name).await);
    }
    let operation_id: i64 = server.open_operation(supervisor, 2).await;
    for member in &members {
        server.join(operation_id, *member).await;
    }

    for member in &members[..2] {
        let (status, body) = server
            .call(
                "POST",
                "/participations/cancel",
                Some(*member),
                Some(json!({ "operation_id": operation_id, "member_id": member })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], json!(true));
    }

    let (status, summary) = server
        .call(
            "GET",
            &format!("/operations/{operation_id}"),
            Some(supervisor),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["vacancies"], json!(2));

    let (status, bulk) = server
        .call(
            "POST",
            &format!("/operations/{operation_id}/bulk_approve"),
            Some(supervisor),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{bulk}");
    assert_eq!(bulk["approved"], json!(2));
    assert_eq!(bulk["failed"], json!(0));
}

#[tokio::test]
async fn test_member_cannot_bulk_approve() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let member: i64 = server.register(supervisor, "Ana").await;
    let operation_id: i64 = server.open_operation(supervisor, 1).await;

    let (status, _) = server
        .call(
            "POST",
            &format!("/operations/{operation_id}/bulk_approve"),
            Some(member),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_quota_status_counts_joined_activity() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let member: i64 = server.register(supervisor, "Ana").await;
    let operation_id: i64 = server.open_operation(supervisor, 2).await;
    server.join(operation_id, member).await;

    let (status, quota) = server
        .call(
            "GET",
            &format!("/members/{member}/quota?date={}", days_from_today(7)),
            Some(member),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{quota}");
    assert_eq!(quota["figures"]["activities"], json!(1));
}

#[tokio::test]
async fn test_quota_status_rejects_malformed_date() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;

    let (status, _) = server
        .call(
            "GET",
            &format!("/members/{supervisor}/quota?date=tomorrow"),
            Some(supervisor),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_committed_join_reaches_change_hub() {
    let server: TestServer = TestServer::new();
    let supervisor: i64 = server.bootstrap().await;
    let member: i64 = server.register(supervisor, "Ana").await;
    let operation_id: i64 = server.open_operation(supervisor, 1).await;
    let mut changes: broadcast::Receiver<ChangeNotification> = server.state.hub.subscribe();

    server.join(operation_id, member).await;

    let mut tables: Vec<ChangeTable> = Vec::new();
    while let Ok(change) = changes.try_recv() {
        assert_eq!(change.operation_id, operation_id);
        tables.push(change.table);
    }
    assert!(tables.contains(&ChangeTable::Participations));
    assert!(tables.contains(&ChangeTable::Events));
}

#[tokio::test]
async fn test_live_endpoint_requires_websocket_upgrade() {
    let server: TestServer = TestServer::new();

    let (status, _) = server.call("GET", "/live", None, None).await;

    assert!(status.is_client_error());
}
