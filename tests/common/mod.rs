#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ticket_desk::models::{
    CheckoutItem, CheckoutRequest, Customer, CustomerDetails, Event, IssuedTicket, NewEvent,
    NewOrder, NewTicketType, OrderWithItems, PaymentMethod, TicketType,
};
use ticket_desk::store::{MemoryStore, RecordStore, StoreError};

pub struct Catalog {
    pub event: Event,
    pub vip: TicketType,
    pub general: TicketType,
}

pub async fn seed_catalog(store: &dyn RecordStore) -> Catalog {
    let event = store
        .create_event(NewEvent {
            name: "Summer Festival".to_string(),
            date: "2026-12-05 18:00".to_string(),
            location: "Parque Central".to_string(),
            description: Some("Open air".to_string()),
        })
        .await
        .unwrap();
    let vip = store
        .create_ticket_type(
            event.id,
            NewTicketType {
                name: "VIP".to_string(),
                price: Decimal::new(25000, 2),
                description: None,
            },
        )
        .await
        .unwrap();
    let general = store
        .create_ticket_type(
            event.id,
            NewTicketType {
                name: "Pista".to_string(),
                price: Decimal::new(8000, 2),
                description: None,
            },
        )
        .await
        .unwrap();

    Catalog {
        event,
        vip,
        general,
    }
}

pub fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Ana Souza".to_string(),
        phone: "+55 11 99999-0000".to_string(),
        email: "ana@example.com".to_string(),
        cpf: "123.456.789-09".to_string(),
    }
}

pub fn checkout_request(catalog: &Catalog, vip: i32, general: i32) -> CheckoutRequest {
    CheckoutRequest {
        event_id: catalog.event.id,
        customer: customer(),
        items: vec![
            CheckoutItem {
                ticket_type_id: catalog.vip.id,
                quantity: vip,
            },
            CheckoutItem {
                ticket_type_id: catalog.general.id,
                quantity: general,
            },
        ],
        payment_method: PaymentMethod::Pix,
    }
}

/// Memory store whose ticket inserts can be made to fail, standing in for
/// a dropped database connection.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_inserts: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        self.inner.create_event(event).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.inner.list_events().await
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        self.inner.get_event(event_id).await
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), StoreError> {
        self.inner.delete_event(event_id).await
    }

    async fn create_ticket_type(
        &self,
        event_id: i64,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, StoreError> {
        self.inner.create_ticket_type(event_id, ticket_type).await
    }

    async fn list_ticket_types(&self, event_id: i64) -> Result<Vec<TicketType>, StoreError> {
        self.inner.list_ticket_types(event_id).await
    }

    async fn get_ticket_type(&self, ticket_type_id: i64) -> Result<Option<TicketType>, StoreError> {
        self.inner.get_ticket_type(ticket_type_id).await
    }

    async fn upsert_customer(&self, details: &CustomerDetails) -> Result<Customer, StoreError> {
        self.inner.upsert_customer(details).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, StoreError> {
        self.inner.create_order(order).await
    }

    async fn get_order_with_line_items(
        &self,
        order_id: &str,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        self.inner.get_order_with_line_items(order_id).await
    }

    async fn insert_issued_tickets(&self, rows: &[IssuedTicket]) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.insert_issued_tickets(rows).await
    }

    async fn find_issued_ticket_by_code(
        &self,
        ticket_code: &str,
    ) -> Result<Option<IssuedTicket>, StoreError> {
        self.inner.find_issued_ticket_by_code(ticket_code).await
    }

    async fn find_issued_tickets_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<IssuedTicket>, StoreError> {
        self.inner.find_issued_tickets_by_order(order_id).await
    }

    async fn conditional_mark_validated(
        &self,
        ticket_code: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.inner
            .conditional_mark_validated(ticket_code, validated_at)
            .await
    }
}

/// Memory store where another gate always redeems the ticket between the
/// validator's read and its compare-and-set.
pub struct RacingStore {
    pub inner: MemoryStore,
    pub rival_validated_at: DateTime<Utc>,
}

impl RacingStore {
    pub fn new(rival_validated_at: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            rival_validated_at,
        })
    }
}

#[async_trait]
impl RecordStore for RacingStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        self.inner.create_event(event).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.inner.list_events().await
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        self.inner.get_event(event_id).await
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), StoreError> {
        self.inner.delete_event(event_id).await
    }

    async fn create_ticket_type(
        &self,
        event_id: i64,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, StoreError> {
        self.inner.create_ticket_type(event_id, ticket_type).await
    }

    async fn list_ticket_types(&self, event_id: i64) -> Result<Vec<TicketType>, StoreError> {
        self.inner.list_ticket_types(event_id).await
    }

    async fn get_ticket_type(&self, ticket_type_id: i64) -> Result<Option<TicketType>, StoreError> {
        self.inner.get_ticket_type(ticket_type_id).await
    }

    async fn upsert_customer(&self, details: &CustomerDetails) -> Result<Customer, StoreError> {
        self.inner.upsert_customer(details).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, StoreError> {
        self.inner.create_order(order).await
    }

    async fn get_order_with_line_items(
        &self,
        order_id: &str,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        self.inner.get_order_with_line_items(order_id).await
    }

    async fn insert_issued_tickets(&self, rows: &[IssuedTicket]) -> Result<(), StoreError> {
        self.inner.insert_issued_tickets(rows).await
    }

    async fn find_issued_ticket_by_code(
        &self,
        ticket_code: &str,
    ) -> Result<Option<IssuedTicket>, StoreError> {
        self.inner.find_issued_ticket_by_code(ticket_code).await
    }

    async fn find_issued_tickets_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<IssuedTicket>, StoreError> {
        self.inner.find_issued_tickets_by_order(order_id).await
    }

    async fn conditional_mark_validated(
        &self,
        ticket_code: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // The rival's write lands after our read, just ahead of ours.
        self.inner
            .conditional_mark_validated(ticket_code, self.rival_validated_at)
            .await?;
        self.inner
            .conditional_mark_validated(ticket_code, validated_at)
            .await
    }
}
