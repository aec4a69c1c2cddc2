//! Server configuration via CLI args and environment variables.

use std::net::IpAddr;

use clap::Parser;
use gatekeep_service::ServiceConfig;
use gatekeep_service::engine::AccessPolicy;

/// Login endpoint protected by per-IP rate limiting and a permanent ban list.
#[derive(Parser, Debug, Clone)]
#[command(name = "gatekeep-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "GATEKEEP_HOST")]
    pub host: IpAddr,

    /// Bind port.
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Rate window length in milliseconds.
    #[arg(
        long,
        default_value_t = 60_000,
        env = "GATEKEEP_WINDOW_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_ms: u64,

    /// Requests allowed per IP within one window. The next one bans the IP.
    #[arg(
        long,
        default_value_t = 10,
        env = "GATEKEEP_MAX_REQUESTS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_requests: u64,

    /// Consecutive failed logins that ban an IP.
    #[arg(
        long,
        default_value_t = 5,
        env = "GATEKEEP_MAX_LOGIN_ATTEMPTS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_login_attempts: u32,

    /// Username accepted by `/login`.
    #[arg(long, default_value = "user", env = "GATEKEEP_LOGIN_USER")]
    pub login_user: String,

    /// Password accepted by `/login`.
    #[arg(
        long,
        default_value = "pass",
        env = "GATEKEEP_LOGIN_PASSWORD",
        hide_env_values = true
    )]
    pub login_password: String,

    /// IPs banned at startup (comma-separated).
    #[arg(long, env = "GATEKEEP_BLOCKED_IPS", value_delimiter = ',')]
    pub blocked_ips: Vec<IpAddr>,

    /// Identify clients by the first `X-Forwarded-For` entry. Only enable
    /// behind a reverse proxy that overwrites the header.
    #[arg(long, env = "GATEKEEP_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Allow requests when the ban store cannot be read (default: block).
    #[arg(long, env = "GATEKEEP_FAIL_OPEN")]
    pub fail_open: bool,

    /// CORS allowed origins (comma-separated). `*` allows any origin; empty
    /// disables CORS.
    #[arg(
        long,
        default_value = "*",
        env = "GATEKEEP_CORS_ORIGINS",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,

    /// Log level.
    #[arg(long, default_value = "info", env = "GATEKEEP_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long,
        default_value = "text",
        env = "GATEKEEP_LOG_FORMAT",
        value_parser = ["text", "json"]
    )]
    pub log_format: String,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy {
            window_ms: self.window_ms,
            max_requests: self.max_requests,
            max_login_attempts: self.max_login_attempts,
        }
    }

    /// The service-layer subset of this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            policy: self.policy(),
            login_user: self.login_user.clone(),
            login_password: self.login_password.clone(),
            blocked_ips: self.blocked_ips.clone(),
            fail_open: self.fail_open,
        }
    }
}
