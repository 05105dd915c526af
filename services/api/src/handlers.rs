//! Axum Handlers for the HTTP endpoints
//!
//! The call-control endpoint answers the telephony provider's webhook for an
//! inbound call; the health endpoint is a plain liveness check.

use axum::{
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use callbridge_core::call_control::media_stream_document;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!(%message, "Rejecting request.");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

/// Answers an inbound call with a document that connects it to `/media-stream`.
///
/// Accepts any method; the stream URL is built from the request's `Host` header.
pub async fn incoming_call(headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing Host header".to_string()))?;

    info!(%host, "Answering inbound call with media stream instructions.");
    Ok((
        [(header::CONTENT_TYPE, "text/xml")],
        media_stream_document(host),
    ))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
