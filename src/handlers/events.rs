use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::models::{NewEvent, NewTicketType};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.store.list_events().await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEvent>,
) -> Result<Response, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let event = state.store.create_event(payload).await?;
    tracing::info!(event_id = event.id, name = %event.name, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    let event = state
        .store
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} was not found", event_id)))?;
    Ok(success(event, "Event retrieved"))
}

/// Blocked while orders or issued tickets reference the event.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    state.store.delete_event(event_id).await?;
    tracing::info!(event_id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

pub async fn list_ticket_types(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    if state.store.get_event(event_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Event {} was not found", event_id)));
    }
    let ticket_types = state.store.list_ticket_types(event_id).await?;
    Ok(success(ticket_types, "Ticket types retrieved"))
}

pub async fn create_ticket_type(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(payload): Json<NewTicketType>,
) -> Result<Response, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let ticket_type = state.store.create_ticket_type(event_id, payload).await?;
    tracing::info!(
        event_id,
        ticket_type_id = ticket_type.id,
        price = %ticket_type.price,
        "Ticket type created"
    );
    Ok(created(ticket_type, "Ticket type created"))
}
