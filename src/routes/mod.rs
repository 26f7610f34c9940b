use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::{checkout, events, health_check, tickets};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event).delete(events::delete_event),
        )
        .route(
            "/events/:event_id/ticket-types",
            get(events::list_ticket_types).post(events::create_ticket_type),
        )
        .route("/checkout", post(checkout::checkout))
        .route(
            "/orders/:order_id/tickets",
            get(checkout::list_order_tickets).post(checkout::issue_order_tickets),
        )
        .route("/tickets/validate", post(tickets::validate_ticket))
        .route("/tickets/:code", get(tickets::get_ticket));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state);

    with_security_headers(router, config.production).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.allowed_origins)),
    )
}
