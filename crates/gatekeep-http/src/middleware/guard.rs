//! Access guard: resolves the client address and applies the engine verdict
//! before any route runs.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use gatekeep_service::engine::Verdict;

use crate::error::ApiError;
use crate::state::AppState;

/// Client address resolved by the guard, available to handlers as an
/// `Extension<ClientIp>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Extracts the client IP from the request.
///
/// The TCP peer address is authoritative. The first `X-Forwarded-For` entry
/// is only used when the server sits behind a trusted reverse proxy.
pub fn extract_ip(req: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for
        && let Some(xff) = req.headers().get("x-forwarded-for")
        && let Ok(s) = xff.to_str()
        && let Some(first) = s.split(',').next()
        && let Ok(ip) = first.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

/// Rejects banned (403) and rate-limited (429) clients on every route.
pub async fn access_guard_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ip) = extract_ip(&req, state.trust_forwarded_for()) else {
        tracing::warn!("client address unavailable, rejecting request");
        return Err(ApiError::Forbidden);
    };

    match state.engine().check_request(ip) {
        Verdict::Allow => {}
        Verdict::Blocked => {
            tracing::debug!(%ip, "request from banned IP");
            return Err(ApiError::Forbidden);
        }
        Verdict::RateLimited => {
            tracing::warn!(%ip, "rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }
    }

    req.extensions_mut().insert(ClientIp(ip));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(peer: Option<&str>, xff: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(xff) = xff {
            builder = builder.header("x-forwarded-for", xff);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        }
        req
    }

    #[test]
    fn peer_address_is_used_by_default() {
        let req = request(Some("10.1.2.3:4567"), Some("203.0.113.9"));
        assert_eq!(extract_ip(&req, false), "10.1.2.3".parse().ok());
    }

    #[test]
    fn forwarded_for_used_when_trusted() {
        let req = request(Some("10.1.2.3:4567"), Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(extract_ip(&req, true), "203.0.113.9".parse().ok());
    }

    #[test]
    fn malformed_forwarded_for_falls_back_to_peer() {
        let req = request(Some("10.1.2.3:4567"), Some("not-an-ip"));
        assert_eq!(extract_ip(&req, true), "10.1.2.3".parse().ok());
    }

    #[test]
    fn no_peer_and_no_header_is_unresolved() {
        let req = request(None, None);
        assert_eq!(extract_ip(&req, true), None);
    }
}
