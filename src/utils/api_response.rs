use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope for every private route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        match StatusCode::from_u16(self.status_code) {
            Ok(status) => (status, Json(self)).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    fn build(status: StatusCode, message: String, data: Option<T>, errors: Option<serde_json::Value>) -> Self {
        ApiResponse {
            success: status.is_success(),
            status_code: status.as_u16(),
            message,
            timestamp: Utc::now().to_rfc3339(),
            data,
            errors,
        }
    }

    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self::build(status, message.into(), Some(data), None)
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }

    pub fn error(status: StatusCode, message: impl Into<String>, errors: Option<serde_json::Value>) -> Self {
        Self::build(status, message.into(), None, errors)
    }
}

/// Handler result: an envelope either way.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiResponse<()>>;
