use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::CheckoutError;
use crate::store::StoreError;
use crate::ticketing::IssuanceError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tickets for a committed order could not be stored; the client may
    /// retry issuance for `order_id` alone.
    #[error("Ticket issuance failed for order {order_id}")]
    IssuanceFailed {
        order_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Duplicate ticket code conflict for order {order_id}: {detail}")]
    DuplicateCodeConflict { order_id: String, detail: String },

    #[error("Database error")]
    DatabaseError(#[source] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::IssuanceFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DuplicateCodeConflict { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::IssuanceFailed { .. } => "ISSUANCE_FAILED",
            AppError::DuplicateCodeConflict { .. } => "DUPLICATE_CODE_CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::IssuanceFailed { order_id, source } => {
                error!(order_id = %order_id, error = ?source, "Ticket issuance failed");
            }
            AppError::DuplicateCodeConflict { order_id, detail } => {
                error!(order_id = %order_id, detail = %detail, "Duplicate ticket code conflict");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Conflict(what) | StoreError::UniqueViolation(what) => {
                AppError::Conflict(what)
            }
            other => AppError::DatabaseError(other),
        }
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::InvalidInput(msg) => AppError::ValidationError(msg),
            IssuanceError::OrderNotFound(order_id) => {
                AppError::NotFound(format!("Order '{}' was not found", order_id))
            }
            IssuanceError::IssuanceFailed { order_id, source } => {
                AppError::IssuanceFailed { order_id, source }
            }
            IssuanceError::DuplicateCodeConflict { order_id, detail } => {
                AppError::DuplicateCodeConflict { order_id, detail }
            }
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::InvalidRequest(msg) => AppError::ValidationError(msg),
            err @ (CheckoutError::EventNotFound(_) | CheckoutError::TicketTypeNotFound { .. }) => {
                AppError::NotFound(err.to_string())
            }
            CheckoutError::Store(e) => e.into(),
            CheckoutError::Issuance { source, .. } => source.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => (msg.clone(), None),
            AppError::IssuanceFailed { order_id, .. } => (
                "Order was saved but tickets could not be issued, retry issuance".to_string(),
                Some(json!({ "order_id": order_id })),
            ),
            AppError::DuplicateCodeConflict { order_id, .. } => (
                "Ticket codes for this order conflict with existing tickets".to_string(),
                Some(json!({ "order_id": order_id })),
            ),
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuance_failure_is_retryable() {
        let err: AppError = IssuanceError::IssuanceFailed {
            order_id: "ORD-1".to_string(),
            source: StoreError::InvalidData("boom".to_string()),
        }
        .into();

        assert_eq!(err.code(), "ISSUANCE_FAILED");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_store_errors_map_to_http_statuses() {
        let not_found: AppError = StoreError::NotFound("event 9".to_string()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let conflict: AppError = StoreError::Conflict("event 9".to_string()).into();
        assert_eq!(conflict.code(), "CONFLICT");

        let invalid: AppError = StoreError::InvalidData("bad".to_string()).into();
        assert_eq!(invalid.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
