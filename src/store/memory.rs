use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{RecordStore, StoreError};
use crate::models::{
    Customer, CustomerDetails, Event, IssuedTicket, NewEvent, NewOrder, NewTicketType, Order,
    OrderLineItem, OrderWithItems, TicketType,
};

#[derive(Default)]
struct StoreData {
    events: BTreeMap<i64, Event>,
    ticket_types: BTreeMap<i64, TicketType>,
    customers: BTreeMap<i64, Customer>,
    orders: HashMap<String, Order>,
    line_items: HashMap<String, Vec<OrderLineItem>>,
    tickets: HashMap<String, IssuedTicket>,
    last_id: i64,
}

impl StoreData {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Record store held in process memory.
///
/// All state sits behind one `RwLock`; every mutation, including the
/// validation compare-and-set, runs under the write guard.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<StoreData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut data = self.data.write().await;
        let event = Event {
            id: data.next_id(),
            name: event.name,
            date: event.date,
            location: event.location,
            description: event.description,
        };
        data.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let data = self.data.read().await;
        Ok(data.events.values().cloned().collect())
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let data = self.data.read().await;
        Ok(data.events.get(&event_id).cloned())
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), StoreError> {
        let mut data = self.data.write().await;

        if !data.events.contains_key(&event_id) {
            return Err(StoreError::NotFound(format!("event {}", event_id)));
        }
        let referenced = data.orders.values().any(|o| o.event_id == event_id)
            || data.tickets.values().any(|t| t.event_id == event_id);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "event {} has orders or issued tickets",
                event_id
            )));
        }

        data.events.remove(&event_id);
        data.ticket_types.retain(|_, t| t.event_id != event_id);
        Ok(())
    }

    async fn create_ticket_type(
        &self,
        event_id: i64,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, StoreError> {
        let mut data = self.data.write().await;
        if !data.events.contains_key(&event_id) {
            return Err(StoreError::NotFound(format!("event {}", event_id)));
        }

        let ticket_type = TicketType {
            id: data.next_id(),
            event_id,
            name: ticket_type.name,
            price: ticket_type.price,
            description: ticket_type.description,
        };
        data.ticket_types.insert(ticket_type.id, ticket_type.clone());
        Ok(ticket_type)
    }

    async fn list_ticket_types(&self, event_id: i64) -> Result<Vec<TicketType>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .ticket_types
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn get_ticket_type(&self, ticket_type_id: i64) -> Result<Option<TicketType>, StoreError> {
        let data = self.data.read().await;
        Ok(data.ticket_types.get(&ticket_type_id).cloned())
    }

    async fn upsert_customer(&self, details: &CustomerDetails) -> Result<Customer, StoreError> {
        let mut data = self.data.write().await;

        let existing = data
            .customers
            .values()
            .find(|c| c.cpf == details.cpf)
            .map(|c| c.id);
        let id = match existing {
            Some(id) => id,
            None => data.next_id(),
        };

        let customer = Customer {
            id,
            name: details.name.clone(),
            phone: details.phone.clone(),
            email: details.email.clone(),
            cpf: details.cpf.clone(),
        };
        data.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, StoreError> {
        let total = order.total().ok_or_else(|| {
            StoreError::InvalidData(format!("total of order {} overflows", order.order_id))
        })?;
        let mut data = self.data.write().await;

        if data.orders.contains_key(&order.order_id) {
            return Err(StoreError::UniqueViolation(format!(
                "order_id {}",
                order.order_id
            )));
        }
        if !data.customers.contains_key(&order.customer_id) {
            return Err(StoreError::NotFound(format!("customer {}", order.customer_id)));
        }
        if !data.events.contains_key(&order.event_id) {
            return Err(StoreError::NotFound(format!("event {}", order.event_id)));
        }

        let stored = Order {
            id: data.next_id(),
            total,
            order_id: order.order_id,
            customer_id: order.customer_id,
            event_id: order.event_id,
            customer_name: order.customer_name,
            payment_method: order.payment_method,
            created_at: order.created_at,
        };
        data.orders.insert(stored.order_id.clone(), stored.clone());
        data.line_items
            .insert(stored.order_id.clone(), order.line_items.clone());

        Ok(OrderWithItems {
            order: stored,
            line_items: order.line_items,
        })
    }

    async fn get_order_with_line_items(
        &self,
        order_id: &str,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        let data = self.data.read().await;
        Ok(data.orders.get(order_id).map(|order| OrderWithItems {
            order: order.clone(),
            line_items: data.line_items.get(order_id).cloned().unwrap_or_default(),
        }))
    }

    async fn insert_issued_tickets(&self, rows: &[IssuedTicket]) -> Result<(), StoreError> {
        let mut data = self.data.write().await;

        // Check the whole batch before touching the map so a conflict
        // leaves nothing behind.
        let mut batch = HashSet::with_capacity(rows.len());
        for row in rows {
            if data.tickets.contains_key(&row.ticket_code) || !batch.insert(&row.ticket_code) {
                return Err(StoreError::UniqueViolation(format!(
                    "ticket_code {}",
                    row.ticket_code
                )));
            }
        }

        for row in rows {
            data.tickets.insert(row.ticket_code.clone(), row.clone());
        }
        Ok(())
    }

    async fn find_issued_ticket_by_code(
        &self,
        ticket_code: &str,
    ) -> Result<Option<IssuedTicket>, StoreError> {
        let data = self.data.read().await;
        Ok(data.tickets.get(ticket_code).cloned())
    }

    async fn find_issued_tickets_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<IssuedTicket>, StoreError> {
        let data = self.data.read().await;
        let mut tickets: Vec<IssuedTicket> = data
            .tickets
            .values()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.ticket_code.cmp(&b.ticket_code));
        Ok(tickets)
    }

    async fn conditional_mark_validated(
        &self,
        ticket_code: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut data = self.data.write().await;
        match data.tickets.get_mut(ticket_code) {
            Some(ticket) if ticket.validated_at.is_none() => {
                ticket.validated_at = Some(validated_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
