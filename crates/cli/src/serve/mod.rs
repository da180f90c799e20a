//! `nerlens serve` -- web front end plus the analysis relay.
//!
//! Exposes the page and the relay as an async HTTP service using
//! `axum` + `tokio`. Every request is handled independently; the only
//! shared state is immutable configuration.
//!
//! Endpoints:
//! - GET  /             - Upload page
//! - POST /             - Page form submission (renders the results page)
//! - POST /api/analyze  - Relay: multipart `file` → backend `/analyze/`
//! - GET  /health       - Server status
//!
//! API responses use Content-Type: application/json; errors are
//! `{"error": "..."}`.

mod handlers;
mod page;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nerlens_core::{BackendClient, RelayError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use self::handlers::{handle_analyze, handle_health, handle_not_found};
use self::page::{handle_index, handle_page_submit};
use self::state::AppState;
use crate::config::ServeConfig;

/// Maximum request body size: 10 MB.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Map a relay failure onto its HTTP status and `{"error": ...}` body.
fn relay_error_response(err: &RelayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_error(status, &err.to_string()).into_response()
}

/// Assemble the router around shared state.
fn build_router(state: Arc<AppState>) -> Router {
    // CORS: the relay API may be called from other local front ends.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index).post(handle_page_submit))
        .route("/health", get(handle_health))
        .route("/api/analyze", post(handle_analyze))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl+C.
///
/// When TLS cert/key paths are configured (and the `tls` feature is on),
/// the server listens over HTTPS using `axum-server` with rustls.
pub async fn start_server(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend = BackendClient::new(config.backend_url.clone());
    info!(backend = %backend.analyze_url(), "relaying analysis requests");
    if config.redact_backend_errors {
        info!("backend error bodies will be redacted");
    }

    let state = Arc::new(AppState {
        backend,
        theme: config.theme.clone(),
        redact_backend_errors: config.redact_backend_errors,
    });
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);

    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&config.tls_cert, &config.tls_key) {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: std::net::SocketAddr = addr.parse()?;
        info!("nerlens listening on https://{}", addr);
        axum_server::bind_rustls(socket_addr, tls)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("nerlens listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    info!("received shutdown signal");
}
