// Web server — Axum-based JSON API around the session.
//
// POST /process    upload a corpus (multipart field "file") and train
// POST /visualize  scatter dataset for two axes of the current model
// GET  /status     what the session currently holds
// GET  /health     liveness check
//
// Every error response is a JSON body {"error", "kind"}; no AxisError takes
// the process down.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::decomposition::DecompositionEngine;
use crate::error::AxisError;
use crate::session::Session;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub engine: Arc<dyn DecompositionEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Fresh, untrained state for the given configuration and engine.
    pub fn new(config: Config, engine: Arc<dyn DecompositionEngine>) -> Self {
        Self {
            session: Arc::new(Session::new(config.decomposition_params())),
            engine,
            config: Arc::new(config),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, engine: Arc<dyn DecompositionEngine>) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let state = AppState::new(config, engine);
    let app = build_router(state);

    info!("semaxis listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/process", post(handlers::train::process))
        .route("/visualize", post(handlers::visualize::visualize))
        .route("/status", get(handlers::status::get_status))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// JSON error response: `{"error": message, "kind": kind}`.
pub fn api_error(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        axum::Json(serde_json::json!({
            "error": message,
            "kind": kind,
        })),
    )
        .into_response()
}

impl IntoResponse for AxisError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            warn!(kind = self.kind(), error = %self, "Request rejected");
            StatusCode::BAD_REQUEST
        } else {
            error!(kind = self.kind(), error = %self, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, self.kind(), &self.to_string())
    }
}
