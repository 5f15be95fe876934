use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::response::Json;
use serde_json::{json, Value};
use shared::{CheckRequest, ErrorLogRequest, ErrorLogResponse, GenerateRequest, GenerateResponse, PrintabilityReport};

use crate::ai;
use crate::error::ApiError;
use crate::error_log;
use crate::AppState;

/// Client identity for rate limiting: the peer address, or `"unknown"`
/// without connection info. The first `x-forwarded-for` hop is used only
/// when the config trusts a fronting proxy.
pub struct ClientAddr(pub String);

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let forwarded = state
            .config
            .trust_forwarded_for
            .then(|| {
                parts
                    .headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .flatten();

        let addr = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientAddr(addr))
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "SketchForge API v1", "status": "running" }))
}

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Sketch + description → model source
pub async fn generate(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if !state.limiter.check(&client) {
        tracing::warn!(%client, "Rate limit exceeded");
        return Err(ApiError::too_many_requests());
    }
    if let Some(image) = request.image_base64.as_deref() {
        ai::decode_image(image)?;
    }

    let generated = state.generator.generate(&request).await.map_err(|e| {
        tracing::error!(%client, "Generation failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(GenerateResponse {
        code: generated.code,
        raw_response: Some(generated.raw),
    }))
}

/// Client error report → log file
pub async fn log_error(
    State(state): State<AppState>,
    Json(report): Json<ErrorLogRequest>,
) -> Json<ErrorLogResponse> {
    match error_log::write_report(&state.config.log_dir, &report).await {
        Ok(path) => {
            tracing::info!(source = %report.source, file = %path.display(), "Logged client error");
            Json(ErrorLogResponse::Logged {
                file: path.display().to_string(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to write error log: {}", e);
            Json(ErrorLogResponse::Failed {
                error: e.to_string(),
            })
        }
    }
}

/// Source text → printability report
pub async fn check(Json(request): Json<CheckRequest>) -> Json<PrintabilityReport> {
    Json(shared::printability::check(&request.code))
}
