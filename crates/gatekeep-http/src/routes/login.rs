//! Credential check endpoint, guarded by the failed-attempt counter.

use axum::Extension;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use gatekeep_service::engine::LoginOutcome;

use crate::error::ApiError;
use crate::middleware::guard::ClientIp;
use crate::state::AppState;
use crate::types::{LOGIN_BLOCKED, LOGIN_FAILED, LOGIN_SUCCEEDED, LoginRequest, LoginResponse};

/// Log in with a username and password.
///
/// A failure counts against the client IP; the last allowed failure bans it.
/// A success clears the count.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Credentials rejected", body = LoginResponse),
        (status = 403, description = "IP banned", body = LoginResponse),
        (status = 429, description = "Rate window exceeded", body = crate::types::MessageBody),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state.engine().login(ip, &req.username, &req.password);
    let (status, message) = match outcome {
        LoginOutcome::Succeeded => {
            tracing::info!(%ip, "login succeeded");
            (StatusCode::OK, LOGIN_SUCCEEDED)
        }
        LoginOutcome::Failed { .. } => (StatusCode::UNAUTHORIZED, LOGIN_FAILED),
        LoginOutcome::Banned => (StatusCode::FORBIDDEN, LOGIN_BLOCKED),
    };

    Ok((
        status,
        Json(LoginResponse {
            message: message.to_string(),
            attempts_left: outcome.attempts_left(),
        }),
    ))
}
