//! Gatekeep HTTP: REST transport adapter for the gatekeep access engine.
//!
//! Provides:
//! - `GET /` greeting and `POST /login`
//! - `/health` and Prometheus `/metrics`
//! - OpenAPI document at `/api/openapi.json`
//! - Access guard (ban + rate window), request-ID, CORS middleware

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use state::{AppState, CorsOrigins, InvalidOrigin};

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatekeep API",
        description = "Login endpoint protected by a per-IP rate window, a failed-login counter and a permanent ban set.\n\nEvery route answers 403 `access denied` for banned IPs and 429 when a request overflows the rate window (which also bans the IP).",
        license(name = "Apache-2.0"),
    ),
    paths(
        routes::system::root,
        routes::system::health,
        routes::login::login,
    ),
    components(
        schemas(
            types::LoginRequest, types::LoginResponse, types::MessageBody,
            types::HealthResponse, gatekeep_service::engine::AccessPolicy,
        )
    ),
    tags(
        (name = "Auth", description = "Credential checks"),
        (name = "System", description = "System and health endpoints"),
    )
)]
struct ApiDoc;

async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the HTTP API router.
///
/// The access guard wraps every route, including unknown paths, so a banned
/// IP receives 403 no matter what it requests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/login", post(routes::login::login))
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics_endpoint))
        .route("/api/openapi.json", get(openapi_json))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::guard::access_guard_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .layer(cors_layer(&state))
        .with_state(state)
}

/// Serve the HTTP router on the given listener with graceful shutdown.
///
/// Wraps `axum::serve` with `ConnectInfo<SocketAddr>` so the access guard
/// can see the peer address of every connection.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let x_request_id = middleware::request_id::X_REQUEST_ID.clone();
    let base = || {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([axum::http::header::CONTENT_TYPE, x_request_id.clone()])
            .expose_headers([x_request_id.clone()])
    };

    match state.cors_origins() {
        // No origins configured → no CORS headers (deny cross-origin by default).
        CorsOrigins::None => CorsLayer::new(),
        CorsOrigins::Any => {
            tracing::warn!("CORS configured with wildcard origin, all cross-origin requests allowed");
            base().allow_origin(tower_http::cors::Any)
        }
        CorsOrigins::List(origins) => base().allow_origin(origins.clone()),
    }
}
