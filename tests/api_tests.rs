mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use ticket_desk::config::Config;
use ticket_desk::routes::create_routes;
use ticket_desk::state::AppState;
use ticket_desk::store::MemoryStore;

fn app() -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    create_routes(AppState::new(Arc::new(MemoryStore::new())), &config)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) -> (i64, i64) {
    let (status, event) = send(
        app,
        Method::POST,
        "/api/events",
        Some(json!({
            "name": "Summer Festival",
            "date": "2026-12-05 18:00",
            "location": "Parque Central"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["data"]["id"].as_i64().unwrap();

    let (status, ticket_type) = send(
        app,
        Method::POST,
        &format!("/api/events/{}/ticket-types", event_id),
        Some(json!({ "name": "VIP", "price": "250.00", "desc": "Front row" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (event_id, ticket_type["data"]["id"].as_i64().unwrap())
}

fn checkout_body(event_id: i64, ticket_type_id: i64, quantity: i32) -> Value {
    json!({
        "event_id": event_id,
        "customer": {
            "name": "Ana Souza",
            "phone": "+55 11 99999-0000",
            "email": "ana@example.com",
            "cpf": "123.456.789-09"
        },
        "items": [{ "ticket_type_id": ticket_type_id, "quantity": quantity }],
        "payment_method": "pix"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_checkout_then_gate_scan() {
    let app = app();
    let (event_id, ticket_type_id) = seed(&app).await;

    let (status, receipt) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(checkout_body(event_id, ticket_type_id, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["data"]["order"]["total"], "500.00");
    assert_eq!(receipt["data"]["issuance"]["status"], "ISSUED");

    let tickets = receipt["data"]["issuance"]["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    let code = tickets[0]["ticket_code"].as_str().unwrap().to_string();

    let (status, lookup) = send(&app, Method::GET, &format!("/api/tickets/{}", code), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lookup["data"]["state"], "UNVALIDATED");

    let (_, first) = send(
        &app,
        Method::POST,
        "/api/tickets/validate",
        Some(json!({ "code": code.to_lowercase() })),
    )
    .await;
    assert_eq!(first["data"]["admitted"], true);
    assert_eq!(first["data"]["reason"], "ADMITTED");
    assert_eq!(first["data"]["ticket"]["customer_name"], "Ana Souza");

    let (status, second) = send(
        &app,
        Method::POST,
        "/api/tickets/validate",
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["admitted"], false);
    assert_eq!(second["data"]["reason"], "ALREADY_VALIDATED");
    assert!(second["data"]["ticket"]["validated_at"].is_string());
}

#[tokio::test]
async fn test_unknown_code_is_rejected_not_errored() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tickets/validate",
        Some(json!({ "code": "TKT-3-ZZZZZZ-9" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admitted"], false);
    assert_eq!(body["data"]["reason"], "NOT_FOUND");
}

#[tokio::test]
async fn test_order_tickets_can_be_refetched_and_reissued() {
    let app = app();
    let (event_id, ticket_type_id) = seed(&app).await;
    let (_, receipt) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(checkout_body(event_id, ticket_type_id, 3)),
    )
    .await;
    let order_id = receipt["data"]["order"]["order_id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{}/tickets", order_id);

    let (status, listed) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().unwrap().len(), 3);

    let (status, reissued) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reissued["data"]["status"], "ALREADY_ISSUED");
    assert_eq!(reissued["data"]["tickets"].as_array().unwrap().len(), 3);

    let (status, missing) = send(&app, Method::GET, "/api/orders/ORD-NOPE/tickets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_checkout_rejects_bad_input() {
    let app = app();
    let (event_id, ticket_type_id) = seed(&app).await;

    let mut bad_cpf = checkout_body(event_id, ticket_type_id, 1);
    bad_cpf["customer"]["cpf"] = json!("123");
    let (status, body) = send(&app, Method::POST, "/api/checkout", Some(bad_cpf)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(checkout_body(event_id, ticket_type_id, 20_000)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(checkout_body(event_id, 9999, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_with_orders_cannot_be_deleted() {
    let app = app();
    let (event_id, ticket_type_id) = seed(&app).await;
    let event_uri = format!("/api/events/{}", event_id);

    send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(checkout_body(event_id, ticket_type_id, 1)),
    )
    .await;

    let (status, body) = send(&app, Method::DELETE, &event_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send(&app, Method::GET, &event_uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ticket_type_price_validation() {
    let app = app();
    let (event_id, _) = seed(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/events/{}/ticket-types", event_id),
        Some(json!({ "name": "Cheap", "price": "-1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/events/9999/ticket-types",
        Some(json!({ "name": "Ghost", "price": "10.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
