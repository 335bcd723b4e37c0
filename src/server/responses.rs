//! Response bodies
//!
//! JSON shapes returned to clients, including the error envelope.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::FileDropError;
use crate::error::handlers::{error_to_status, handle_error};

/// A stored file and where to download it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileLink {
    pub name: String,
    pub url: String,
}

/// Service description returned from `/`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub upload_folder: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Error envelope: numeric code, reason phrase and a description that echoes
/// the offending input where there is one
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub name: String,
    pub description: String,
}

impl IntoResponse for FileDropError {
    fn into_response(self) -> Response {
        handle_error(&self);

        let status = error_to_status(&self);
        let body = ErrorBody {
            code: status.as_u16(),
            name: status.canonical_reason().unwrap_or("Error").to_string(),
            description: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Wraps bare error responses produced outside the handlers (the timeout
/// layer, mostly) in the same JSON envelope as every other failure
pub async fn error_envelope(response: Response) -> Response {
    let status = response.status();
    let is_failure = status.is_client_error() || status.is_server_error();
    if !is_failure || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let description = match status {
        StatusCode::REQUEST_TIMEOUT => "The request took too long to complete".to_string(),
        other => other.canonical_reason().unwrap_or("Error").to_string(),
    };
    FileDropError::Rejected(status, description).into_response()
}
