// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor extraction for the server.
//!
//! Session handling lives in front of this service. By the time a request
//! arrives the upstream gateway has resolved the caller to a member id and
//! forwarded it in the `X-Member-Id` header. The role is never taken from
//! the request: it is loaded from the roster.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use muster_api::{AuthenticatedActor, AuthenticationService};
use tracing::{debug, warn};

use crate::AppState;

/// Header carrying the caller's member id.
pub const MEMBER_HEADER: &str = "x-member-id";

/// Extractor for the authenticated caller.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(
///     SessionMember(actor): SessionMember,
/// ) -> Result<Json<Response>, HttpError> {
///     // actor: AuthenticatedActor
///     Ok(Json(Response { ... }))
/// }
/// ```
///
/// # Errors
///
/// Returns HTTP 401 Unauthorized if:
/// - The member header is missing
/// - The member header is not an integer id
/// - The member is unknown or inactive
pub struct SessionMember(pub AuthenticatedActor);

impl FromRequestParts<AppState> for SessionMember {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw: &str = parts
            .headers
            .get(MEMBER_HEADER)
            .ok_or_else(|| {
                debug!("Missing member header");
                SessionError::MissingMemberHeader
            })?
            .to_str()
            .map_err(|_| {
                warn!("Invalid member header encoding");
                SessionError::InvalidMemberHeader
            })?;

        let member_id: i64 = raw.trim().parse().map_err(|_| {
            warn!(value = raw, "Member header is not an id");
            SessionError::InvalidMemberHeader
        })?;

        let mut persistence = state.persistence.lock().await;
        let actor: AuthenticatedActor =
            AuthenticationService::authenticate(&mut persistence, member_id).map_err(|e| {
                warn!(member_id, error = %e, "Authentication failed");
                SessionError::AuthenticationFailed(e.to_string())
            })?;

        debug!(member_id, role = ?actor.role, "Caller authenticated");

        Ok(Self(actor))
    }
}

/// Actor extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// The member header is missing.
    MissingMemberHeader,
    /// The member header is not a valid id.
    InvalidMemberHeader,
    /// The member could not be authenticated.
    AuthenticationFailed(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingMemberHeader => (StatusCode::UNAUTHORIZED, "Missing X-Member-Id header"),
            Self::InvalidMemberHeader => (
                StatusCode::UNAUTHORIZED,
                "Invalid X-Member-Id header. Expected an integer member id",
            ),
            Self::AuthenticationFailed(reason) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    format!("Authentication failed: {reason}"),
                )
                    .into_response();
            }
        };

        (status, message).into_response()
    }
}
