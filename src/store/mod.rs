//! The record store: durable home for events, ticket types, customers,
//! orders and issued tickets.
//!
//! One [`RecordStore`] is selected at startup and shared behind an `Arc`.
//! Ticketing relies on two guarantees from every implementation:
//!
//! - `insert_issued_tickets` is all-or-nothing and rejects a duplicate
//!   `ticket_code` with [`StoreError::UniqueViolation`].
//! - `conditional_mark_validated` is a single atomic compare-and-set on
//!   `validated_at IS NULL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::config::StoreBackend;
use crate::models::{
    Customer, CustomerDetails, Event, IssuedTicket, NewEvent, NewOrder, NewTicketType,
    OrderWithItems, TicketType,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError>;

    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError>;

    /// Deletes the event and its ticket types. Fails with
    /// [`StoreError::Conflict`] while any order or issued ticket references
    /// the event.
    async fn delete_event(&self, event_id: i64) -> Result<(), StoreError>;

    async fn create_ticket_type(
        &self,
        event_id: i64,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, StoreError>;

    async fn list_ticket_types(&self, event_id: i64) -> Result<Vec<TicketType>, StoreError>;

    async fn get_ticket_type(&self, ticket_type_id: i64) -> Result<Option<TicketType>, StoreError>;

    /// Resolves a customer by normalized CPF, refreshing contact details, or
    /// creates one. Last write wins.
    async fn upsert_customer(&self, details: &CustomerDetails) -> Result<Customer, StoreError>;

    /// Commits the order and its line items together.
    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, StoreError>;

    async fn get_order_with_line_items(
        &self,
        order_id: &str,
    ) -> Result<Option<OrderWithItems>, StoreError>;

    async fn insert_issued_tickets(&self, rows: &[IssuedTicket]) -> Result<(), StoreError>;

    async fn find_issued_ticket_by_code(
        &self,
        ticket_code: &str,
    ) -> Result<Option<IssuedTicket>, StoreError>;

    async fn find_issued_tickets_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<IssuedTicket>, StoreError>;

    /// Sets `validated_at` only if it is still unset. Returns whether this
    /// call performed the transition.
    async fn conditional_mark_validated(
        &self,
        ticket_code: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn RecordStore>, StoreError> {
    match backend {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresStore::connect(database_url, *max_connections).await?;
            tracing::info!("Successfully connected to database");

            store.migrate().await?;
            tracing::info!("Migrations run successfully");

            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
