use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::state::AppState;
use crate::ticketing::ValidationReason;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct ValidateTicketRequest {
    pub code: String,
}

/// Gate scan. Rejections come back as a normal response with
/// `admitted: false` and a reason.
pub async fn validate_ticket(
    State(state): State<AppState>,
    Json(payload): Json<ValidateTicketRequest>,
) -> Result<Response, AppError> {
    let outcome = state.validation.validate(&payload.code).await?;
    let message = match outcome.reason {
        ValidationReason::Admitted => "Ticket admitted",
        ValidationReason::NotFound => "Ticket not found",
        ValidationReason::AlreadyValidated => "Ticket already validated",
    };
    Ok(success(outcome, message))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let ticket = state
        .validation
        .lookup(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' was not found", code.trim())))?;
    Ok(success(ticket, "Ticket retrieved"))
}
