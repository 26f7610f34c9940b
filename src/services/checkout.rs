//! Checkout completion: resolve the customer, commit the order with its
//! line items, then hand the committed order to issuance.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    max_amount, normalize_cpf, CheckoutItem, CheckoutRequest, CustomerDetails, NewOrder, Order,
    OrderLineItem, OrderWithItems, MAX_UNITS_PER_ORDER,
};
use crate::store::{RecordStore, StoreError};
use crate::ticketing::{Issuance, IssuanceEngine, IssuanceError};

const ORDER_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("ticket type {ticket_type_id} not found for event {event_id}")]
    TicketTypeNotFound { event_id: i64, ticket_type_id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The order is committed; only issuance needs to be retried.
    #[error("order '{order_id}' was created but ticket issuance failed")]
    Issuance {
        order_id: String,
        #[source]
        source: IssuanceError,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub line_items: Vec<OrderLineItem>,
    pub issuance: Issuance,
}

#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn RecordStore>,
    issuance: IssuanceEngine,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn RecordStore>, issuance: IssuanceEngine) -> Self {
        Self { store, issuance }
    }

    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, CheckoutError> {
        let customer = normalize_customer(&request.customer)?;
        let items = merge_items(&request.items)?;

        if self.store.get_event(request.event_id).await?.is_none() {
            return Err(CheckoutError::EventNotFound(request.event_id));
        }

        let mut priced = Vec::with_capacity(items.len());
        for item in &items {
            let ticket_type = self
                .store
                .get_ticket_type(item.ticket_type_id)
                .await?
                .filter(|t| t.event_id == request.event_id)
                .ok_or(CheckoutError::TicketTypeNotFound {
                    event_id: request.event_id,
                    ticket_type_id: item.ticket_type_id,
                })?;
            priced.push((ticket_type, item.quantity));
        }

        let customer = self.store.upsert_customer(&customer).await?;

        let OrderWithItems { order, line_items } = {
            let mut attempt = 0;
            loop {
                attempt += 1;
                let order_id = new_order_id();
                let new_order = NewOrder {
                    line_items: priced
                        .iter()
                        .map(|(ticket_type, quantity)| OrderLineItem {
                            order_id: order_id.clone(),
                            ticket_type_id: ticket_type.id,
                            ticket_name: ticket_type.name.clone(),
                            quantity: *quantity,
                            unit_price: ticket_type.price,
                        })
                        .collect(),
                    order_id,
                    customer_id: customer.id,
                    event_id: request.event_id,
                    customer_name: Some(customer.name.clone()),
                    payment_method: request.payment_method,
                    created_at: Utc::now(),
                };

                if !new_order.total().is_some_and(|total| total <= max_amount()) {
                    return Err(CheckoutError::InvalidRequest(format!(
                        "Order total must not exceed {}",
                        max_amount()
                    )));
                }

                match self.store.create_order(new_order).await {
                    Ok(created) => break created,
                    Err(StoreError::UniqueViolation(detail)) if attempt < ORDER_ID_ATTEMPTS => {
                        warn!(detail = %detail, attempt, "Order id collision, regenerating");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        info!(
            order_id = %order.order_id,
            event_id = order.event_id,
            total = %order.total,
            payment_method = %order.payment_method,
            "Order created"
        );

        let issuance = self
            .issuance
            .issue(&order, &line_items)
            .await
            .map_err(|source| CheckoutError::Issuance {
                order_id: order.order_id.clone(),
                source,
            })?;

        Ok(CheckoutReceipt {
            order,
            line_items,
            issuance,
        })
    }
}

/// Short human-facing order id, e.g. `ORD-3F9A1C0B`.
fn new_order_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..8].to_ascii_uppercase())
}

fn normalize_customer(details: &CustomerDetails) -> Result<CustomerDetails, CheckoutError> {
    let name = details.name.trim();
    if name.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "Customer name is required".to_string(),
        ));
    }
    let cpf = normalize_cpf(&details.cpf).ok_or_else(|| {
        CheckoutError::InvalidRequest(
            "CPF must have 11 digits separated only by dots or dashes".to_string(),
        )
    })?;

    Ok(CustomerDetails {
        name: name.to_string(),
        phone: details.phone.trim().to_string(),
        email: details.email.trim().to_string(),
        cpf,
    })
}

/// One entry per ticket type, quantities summed, first-seen order kept.
fn merge_items(items: &[CheckoutItem]) -> Result<Vec<CheckoutItem>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "At least one ticket must be selected".to_string(),
        ));
    }

    let mut merged: Vec<CheckoutItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(CheckoutError::InvalidRequest(format!(
                "Quantity for ticket type {} must be positive",
                item.ticket_type_id
            )));
        }
        match merged
            .iter_mut()
            .find(|m| m.ticket_type_id == item.ticket_type_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                    CheckoutError::InvalidRequest("Quantity is too large".to_string())
                })?;
            }
            None => merged.push(item.clone()),
        }
    }

    let units: i64 = merged.iter().map(|item| i64::from(item.quantity)).sum();
    if units > MAX_UNITS_PER_ORDER {
        return Err(CheckoutError::InvalidRequest(format!(
            "An order may contain at most {} tickets",
            MAX_UNITS_PER_ORDER
        )));
    }
    Ok(merged)
}
