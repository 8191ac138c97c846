//! HTTP boundary for the flag-management UI.
//!
//! Routes:
//! - `POST /api/flagPreview`: body as [`FlagPreviewRequest`], response from [`handle_flag_preview`]
//! - `GET /health`: liveness probe
//!
//! Bodies axum cannot extract (bad JSON, wrong shape, missing content type)
//! are answered with `400 {"error": "Invalid Request", "detail": ...}`.
//!
//! State is immutable configuration shared across requests; every request
//! builds its own delivery client from the credentials it resolves to.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use flag_preview_core::client::ContentstackClient;
use flag_preview_core::handler::{handle_flag_preview, FlagPreviewRequest};
use flag_preview_core::ErrorKind;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::load_config::CliConfig;

pub type SharedConfig = Arc<CliConfig>;

pub fn create_router(config: SharedConfig) -> Router {
    Router::new()
        .route("/api/flagPreview", post(flag_preview))
        .route("/health", get(health))
        .with_state(config)
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn flag_preview(
    State(config): State<SharedConfig>,
    request: Result<Json<FlagPreviewRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("flag_preview", %request_id);

    // Malformed bodies, wrong content types and shape mismatches are all client errors.
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let detail = rejection.body_text();
            span.in_scope(|| tracing::warn!(status = %rejection.status(), %detail, "Rejected request body"));
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": ErrorKind::Validation.label(), "detail": detail })),
            );
        }
    };

    let delivery = config.delivery.clone();
    let response = handle_flag_preview(
        request,
        config.contentstack.as_ref(),
        &config.preview,
        |creds| ContentstackClient::with_base_url(creds, &delivery.base_url, delivery.timeout),
    )
    .instrument(span)
    .await;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

/// Serve on an already-bound listener until the process is stopped.
pub async fn serve(listener: TcpListener, config: SharedConfig) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Flag preview endpoint listening");
    axum::serve(listener, create_router(config)).await?;
    Ok(())
}
