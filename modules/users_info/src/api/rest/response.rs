//! Uniform JSON envelope for every `/user` response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

/// `{status, description, data}`; `description` is always empty and the
/// payload or the error text travels in `data`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub status: u16,
    pub description: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            status: status.as_u16(),
            description: String::new(),
            data,
        }
    }
}

/// Log the envelope under `label` and render it with `status`.
///
/// 2xx goes to `info`, 4xx/5xx to `error`. A 204 is logged but sent without a body.
pub fn respond<T: Serialize>(label: &str, status: StatusCode, data: T) -> Response {
    let envelope = Envelope::new(status, data);
    let rendered = serde_json::to_string(&envelope).unwrap_or_default();
    let code = envelope.status;

    if code < 300 {
        info!(status = code, response = %rendered, "{label}");
    } else if code >= 400 {
        error!(status = code, response = %rendered, "{label}");
    }

    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(envelope)).into_response()
}
