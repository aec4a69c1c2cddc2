//! Request/response types for the gatekeep HTTP API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use gatekeep_service::engine::AccessPolicy;

pub const LOGIN_SUCCEEDED: &str = "login succeeded";
pub const LOGIN_FAILED: &str = "login failed, try again";
pub const LOGIN_BLOCKED: &str = "IP blocked due to excessive login attempts";

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account name. A missing field counts as a failed login.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    /// Failed logins left before the IP is banned. Absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<u32>,
}

/// Body of every rejection.
#[derive(Serialize, ToSchema)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server status ("ok").
    pub status: String,
    /// Server version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// IPs banned since startup.
    pub banned_ips: u64,
    /// IPs with a live rate window.
    pub tracked_windows: usize,
    /// Active thresholds.
    pub policy: AccessPolicy,
}
