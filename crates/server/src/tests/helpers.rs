// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use muster_api::{CreateOperationRequest, CreateWindowRequest};
use muster_domain::SchedulingPolicy;
use serde_json::{Value, json};
use time::{Date, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::AppState;
use crate::live::LiveConfig;
use crate::routes::build_router;
use crate::session::MEMBER_HEADER;

/// A router over a fresh in-memory database.
pub struct TestServer {
    pub app: Router,
    pub state: AppState,
}

impl TestServer {
    pub fn new() -> Self {
        let state: AppState =
            AppState::build(None, SchedulingPolicy::default(), LiveConfig::default()).unwrap();
        Self {
            app: build_router(state.clone()),
            state,
        }
    }

    /// Sends one request and decodes the JSON body, if any.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        member_id: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(member_id) = member_id {
            builder = builder.header(MEMBER_HEADER, member_id.to_string());
        }
        let request: Request<Body> = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status: StatusCode = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Seeds a supervisor and returns their id.
    pub async fn bootstrap(&self) -> i64 {
        let (status, body) = self
            .call("POST", "/bootstrap", None, Some(json!({ "name": "Chief" })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["member_id"].as_i64().unwrap()
    }

    pub async fn register(&self, supervisor: i64, name: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/members",
                Some(supervisor),
                Some(json!({ "name": name, "role": "MEMBER" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["member_id"].as_i64().unwrap()
    }

    /// Creates a window around today and one open operation inside it.
    pub async fn open_operation(&self, supervisor: i64, capacity: u32) -> i64 {
        let window = CreateWindowRequest {
            start: days_from_today(-1),
            end: days_from_today(60),
            modalities: vec![String::from("BLITZ"), String::from("BALANCA")],
            daily_operation_limit: 3,
        };
        let (status, body) = self
            .call(
                "POST",
                "/windows",
                Some(supervisor),
                Some(serde_json::to_value(&window).unwrap()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let window_id: i64 = body["window_id"].as_i64().unwrap();

        let operation = CreateOperationRequest {
            window_id,
            date: days_from_today(7),
            modality: String::from("BLITZ"),
            kind: String::from("VOLUNTARY"),
            capacity,
        };
        let (status, body) = self
            .call(
                "POST",
                "/operations",
                Some(supervisor),
                Some(serde_json::to_value(&operation).unwrap()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["operation_id"].as_i64().unwrap()
    }

    pub async fn join(&self, operation_id: i64, member_id: i64) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/participations/join",
                Some(member_id),
                Some(json!({ "operation_id": operation_id, "member_id": member_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

pub fn days_from_today(days: i64) -> Date {
    OffsetDateTime::now_utc().date() + Duration::days(days)
}
