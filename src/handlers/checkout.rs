use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::models::CheckoutRequest;
use crate::state::AppState;
use crate::ticketing::IssuanceStatus;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Response, AppError> {
    let receipt = state.checkout.checkout(payload).await?;
    Ok(created(receipt, "Order completed"))
}

/// Re-runs issuance for a committed order. Safe to call repeatedly.
pub async fn issue_order_tickets(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    let issuance = state.issuance.issue_order(&order_id).await?;
    let message = match issuance.status {
        IssuanceStatus::Issued => "Tickets issued",
        IssuanceStatus::AlreadyIssued => "Tickets were already issued",
    };
    Ok(success(issuance, message))
}

pub async fn list_order_tickets(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    if state
        .store
        .get_order_with_line_items(&order_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Order '{}' was not found",
            order_id
        )));
    }
    let tickets = state.issuance.tickets_for_order(&order_id).await?;
    Ok(success(tickets, "Tickets retrieved"))
}
