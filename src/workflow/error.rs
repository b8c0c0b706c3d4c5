use axum::http::StatusCode;
use serde_json::json;

use crate::db::store::StoreError;
use crate::payment::gateway::GatewayError;
use crate::utils::api_response::ApiResponse;

/// Failure of a workflow or payment operation.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    /// Another writer moved the entity between our read and our write.
    #[error("{0}")]
    Conflict(String),

    /// The target is still referenced; retrying cannot succeed.
    #[error("{0}")]
    InUse(String),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("payment tracking schema unavailable: {0}")]
    SchemaUnavailable(String),
}

/// The three answers a user can get back from a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    NotAllowed,
    TemporarilyUnavailable,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::NotAllowed => "not_allowed",
            ErrorCategory::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "Your input was invalid",
            ErrorCategory::NotAllowed => "You are not allowed to do this",
            ErrorCategory::TemporarilyUnavailable => {
                "The system could not complete this right now, please retry"
            }
        }
    }
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        WorkflowError::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        WorkflowError::NotFound(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Validation(_) | WorkflowError::NotFound(_) => ErrorCategory::InvalidInput,
            WorkflowError::Authorization(_) | WorkflowError::InUse(_) => ErrorCategory::NotAllowed,
            WorkflowError::Conflict(_)
            | WorkflowError::Gateway(_)
            | WorkflowError::Persistence(_)
            | WorkflowError::SchemaUnavailable(_) => ErrorCategory::TemporarilyUnavailable,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkflowError::Authorization(_) => StatusCode::FORBIDDEN,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Conflict(_) | WorkflowError::InUse(_) => StatusCode::CONFLICT,
            WorkflowError::Gateway(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WorkflowError::SchemaUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => WorkflowError::NotFound(format!("{what} not found")),
            StoreError::StaleState(what) => {
                WorkflowError::Conflict(format!("{what} was changed by someone else, reload and retry"))
            }
            StoreError::Duplicate(what) => WorkflowError::Validation(format!("{what} already exists")),
            StoreError::InUse(what) => WorkflowError::InUse(format!("{what}; remove those first")),
            StoreError::SchemaUnavailable(what) => WorkflowError::SchemaUnavailable(what),
            StoreError::Database(e) => WorkflowError::Persistence(e.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiResponse<()> {
    fn from(err: WorkflowError) -> Self {
        let category = err.category();
        ApiResponse::error(
            err.status_code(),
            err.to_string(),
            Some(json!({
                "category": category.as_str(),
                "hint": category.user_message(),
            })),
        )
    }
}
