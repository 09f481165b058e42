use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::workflow::WorkflowError;

impl WorkflowError {
    /// Stable machine-readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Validation(_) => "validation",
            WorkflowError::QuotaExhausted { .. } => "quota_exhausted",
            WorkflowError::Forbidden(_) => "forbidden",
            WorkflowError::InvalidState(_) => "invalid_state",
            WorkflowError::Storage(_) => "internal",
        }
    }
}

impl ResponseError for WorkflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkflowError::QuotaExhausted { .. } | WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
            WorkflowError::InvalidState(_) => StatusCode::CONFLICT,
            WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            WorkflowError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message
        }))
    }
}
