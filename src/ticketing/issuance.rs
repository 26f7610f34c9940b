//! Expands a committed order into one issued ticket per purchased unit.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use super::code;
use super::error::IssuanceError;
use crate::models::{IssuedTicket, Order, OrderLineItem, MAX_UNITS_PER_ORDER};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceStatus {
    /// This call persisted the tickets.
    Issued,
    /// The same set was already stored by an earlier call.
    AlreadyIssued,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issuance {
    pub order_id: String,
    pub status: IssuanceStatus,
    pub tickets: Vec<IssuedTicket>,
}

/// Builds the tickets for an order without touching the store.
///
/// Unit indexes count per ticket type across the whole order, so two line
/// items for the same type never produce the same code.
pub fn plan(order: &Order, line_items: &[OrderLineItem]) -> Result<Vec<IssuedTicket>, IssuanceError> {
    let units: i64 = line_items.iter().map(|item| i64::from(item.quantity)).sum();
    if units > MAX_UNITS_PER_ORDER {
        return Err(IssuanceError::InvalidInput(format!(
            "order '{}' has {} units, at most {} can be issued",
            order.order_id, units, MAX_UNITS_PER_ORDER
        )));
    }

    let mut next_index: HashMap<i64, u32> = HashMap::new();
    let mut tickets = Vec::new();

    for item in line_items {
        if item.order_id != order.order_id {
            return Err(IssuanceError::InvalidInput(format!(
                "line item belongs to order '{}', not '{}'",
                item.order_id, order.order_id
            )));
        }
        let quantity = u32::try_from(item.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                IssuanceError::InvalidInput(format!(
                    "quantity must be positive, got {} for ticket type {}",
                    item.quantity, item.ticket_type_id
                ))
            })?;

        let start = next_index.entry(item.ticket_type_id).or_insert(0);
        for unit_index in *start..*start + quantity {
            let ticket_code =
                code::generate(&order.order_id, order.event_id, item.ticket_type_id, unit_index)?;
            tickets.push(IssuedTicket {
                order_id: order.order_id.clone(),
                event_id: order.event_id,
                ticket_type_id: item.ticket_type_id,
                ticket_code: ticket_code.into_string(),
                ticket_name: item.ticket_name.clone(),
                unit_price: item.unit_price,
                customer_name: order.customer_name.clone(),
                validated_at: None,
            });
        }
        *start += quantity;
    }

    Ok(tickets)
}

#[derive(Clone)]
pub struct IssuanceEngine {
    store: Arc<dyn RecordStore>,
}

impl IssuanceEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Issues tickets for an order already committed to the store.
    pub async fn issue(
        &self,
        order: &Order,
        line_items: &[OrderLineItem],
    ) -> Result<Issuance, IssuanceError> {
        let planned = plan(order, line_items)?;

        match self.store.insert_issued_tickets(&planned).await {
            Ok(()) => {
                info!(
                    order_id = %order.order_id,
                    event_id = order.event_id,
                    count = planned.len(),
                    "Tickets issued"
                );
                Ok(Issuance {
                    order_id: order.order_id.clone(),
                    status: IssuanceStatus::Issued,
                    tickets: planned,
                })
            }
            Err(StoreError::UniqueViolation(detail)) => {
                self.resolve_conflict(&order.order_id, planned, detail).await
            }
            Err(source) => Err(IssuanceError::IssuanceFailed {
                order_id: order.order_id.clone(),
                source,
            }),
        }
    }

    /// Loads the order from the store and issues its tickets. Used for
    /// retries after a failed issuance.
    pub async fn issue_order(&self, order_id: &str) -> Result<Issuance, IssuanceError> {
        let found = self
            .store
            .get_order_with_line_items(order_id)
            .await
            .map_err(|source| IssuanceError::IssuanceFailed {
                order_id: order_id.to_string(),
                source,
            })?
            .ok_or_else(|| IssuanceError::OrderNotFound(order_id.to_string()))?;

        self.issue(&found.order, &found.line_items).await
    }

    /// Issued tickets for an order, for printing. Empty when issuance has
    /// not happened yet.
    pub async fn tickets_for_order(&self, order_id: &str) -> Result<Vec<IssuedTicket>, StoreError> {
        self.store.find_issued_tickets_by_order(order_id).await
    }

    async fn resolve_conflict(
        &self,
        order_id: &str,
        planned: Vec<IssuedTicket>,
        detail: String,
    ) -> Result<Issuance, IssuanceError> {
        let existing = self
            .store
            .find_issued_tickets_by_order(order_id)
            .await
            .map_err(|source| IssuanceError::IssuanceFailed {
                order_id: order_id.to_string(),
                source,
            })?;

        let planned_codes: BTreeSet<&str> =
            planned.iter().map(|t| t.ticket_code.as_str()).collect();
        let existing_codes: BTreeSet<&str> =
            existing.iter().map(|t| t.ticket_code.as_str()).collect();

        if planned_codes == existing_codes {
            info!(order_id = %order_id, count = existing.len(), "Tickets already issued");
            return Ok(Issuance {
                order_id: order_id.to_string(),
                status: IssuanceStatus::AlreadyIssued,
                tickets: existing,
            });
        }

        warn!(
            order_id = %order_id,
            planned = planned_codes.len(),
            stored = existing_codes.len(),
            detail = %detail,
            "Ticket code conflict does not match a previous issuance"
        );
        Err(IssuanceError::DuplicateCodeConflict {
            order_id: order_id.to_string(),
            detail,
        })
    }
}
