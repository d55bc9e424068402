// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Caller identification for the server.
//!
//! Requests identify their caller with the `X-User-Id` header. The id is
//! resolved against the user directory; the role always comes from the
//! stored user, never from the request.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use turnover_api::{AuthenticatedActor, AuthenticationService};
use turnover_domain::User;

use crate::AppState;

/// The header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extractor for the authenticated caller.
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing, is not a number, or
/// names no registered user.
pub struct CurrentUser(pub AuthenticatedActor, pub User);

fn presented_user_id(parts: &Parts) -> Result<Option<i64>, SessionError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let text: &str = value.to_str().map_err(|_| {
        warn!("Invalid {USER_ID_HEADER} header encoding");
        SessionError::InvalidUserIdHeader
    })?;
    text.trim().parse::<i64>().map(Some).map_err(|_| {
        warn!(value = text, "{USER_ID_HEADER} header is not a user id");
        SessionError::InvalidUserIdHeader
    })
}

async fn resolve(state: &AppState, user_id: i64) -> Result<CurrentUser, SessionError> {
    let mut persistence = state.persistence.lock().await;
    let (actor, user) = AuthenticationService::authenticate(&mut persistence, user_id)
        .map_err(|e| {
            warn!(user_id, error = %e, "Caller identification failed");
            SessionError::UnknownUser(e.to_string())
        })?;
    drop(persistence);

    debug!(user_id, role = %actor.role, "Identified caller");
    Ok(CurrentUser(actor, user))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id: i64 = presented_user_id(parts)?.ok_or_else(|| {
            debug!("Missing {USER_ID_HEADER} header");
            SessionError::MissingUserIdHeader
        })?;
        resolve(state, user_id).await
    }
}

/// Lets a handler accept anonymous callers, as user bootstrap does.
///
/// A present but invalid header is still rejected.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match presented_user_id(parts)? {
            Some(user_id) => resolve(state, user_id).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Caller identification errors, all answered with HTTP 401.
#[derive(Debug)]
pub enum SessionError {
    MissingUserIdHeader,
    InvalidUserIdHeader,
    UnknownUser(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingUserIdHeader => format!("Missing {USER_ID_HEADER} header"),
            Self::InvalidUserIdHeader => format!("Invalid {USER_ID_HEADER} header"),
            Self::UnknownUser(reason) => format!("Authentication failed: {reason}"),
        };
        crate::HttpError {
            status: StatusCode::UNAUTHORIZED,
            message,
        }
        .into_response()
    }
}
