//! Single-use ticket validation at the gate.
//!
//! The admit decision always comes from the store's compare-and-set on
//! `validated_at`, never from state held by this process, so independent
//! scanners hitting the same code at the same time admit it at most once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::code::TicketCode;
use crate::models::{IssuedTicket, TicketState};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    Admitted,
    NotFound,
    AlreadyValidated,
}

/// What gate staff see about a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub ticket_code: String,
    pub order_id: String,
    pub event_id: i64,
    pub ticket_name: String,
    pub unit_price: Decimal,
    pub customer_name: Option<String>,
    pub state: TicketState,
    pub validated_at: Option<DateTime<Utc>>,
}

impl From<IssuedTicket> for TicketSummary {
    fn from(ticket: IssuedTicket) -> Self {
        Self {
            state: ticket.state(),
            ticket_code: ticket.ticket_code,
            order_id: ticket.order_id,
            event_id: ticket.event_id,
            ticket_name: ticket.ticket_name,
            unit_price: ticket.unit_price,
            customer_name: ticket.customer_name,
            validated_at: ticket.validated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub admitted: bool,
    pub reason: ValidationReason,
    pub ticket: Option<TicketSummary>,
}

impl ValidationOutcome {
    fn admitted(ticket: TicketSummary) -> Self {
        Self {
            admitted: true,
            reason: ValidationReason::Admitted,
            ticket: Some(ticket),
        }
    }

    fn not_found() -> Self {
        Self {
            admitted: false,
            reason: ValidationReason::NotFound,
            ticket: None,
        }
    }

    fn already_validated(ticket: Option<TicketSummary>) -> Self {
        Self {
            admitted: false,
            reason: ValidationReason::AlreadyValidated,
            ticket,
        }
    }
}

#[derive(Clone)]
pub struct ValidationEngine {
    store: Arc<dyn RecordStore>,
}

impl ValidationEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Redeems a scanned or typed code.
    ///
    /// Rejections are outcomes, not errors; only store failures are
    /// returned as `Err`.
    pub async fn validate(&self, input: &str) -> Result<ValidationOutcome, StoreError> {
        let Ok(code) = TicketCode::parse(input) else {
            warn!(input = %input.trim(), "Rejected malformed ticket code");
            return Ok(ValidationOutcome::not_found());
        };

        let Some(ticket) = self.store.find_issued_ticket_by_code(code.as_str()).await? else {
            warn!(ticket_code = %code, "Rejected unknown ticket code");
            return Ok(ValidationOutcome::not_found());
        };

        if ticket.validated_at.is_some() {
            warn!(
                ticket_code = %code,
                validated_at = ?ticket.validated_at,
                "Rejected ticket, already validated"
            );
            return Ok(ValidationOutcome::already_validated(Some(ticket.into())));
        }

        let now = Utc::now();
        if self
            .store
            .conditional_mark_validated(code.as_str(), now)
            .await?
        {
            info!(ticket_code = %code, order_id = %ticket.order_id, "Ticket admitted");
            let mut summary = TicketSummary::from(ticket);
            summary.state = TicketState::Validated;
            summary.validated_at = Some(now);
            return Ok(ValidationOutcome::admitted(summary));
        }

        // Another scanner won the compare-and-set between our read and write.
        warn!(ticket_code = %code, "Rejected ticket, validated concurrently");
        let latest = self
            .store
            .find_issued_ticket_by_code(code.as_str())
            .await?
            .map(TicketSummary::from);
        Ok(ValidationOutcome::already_validated(latest))
    }

    /// Read-only lookup; never changes the ticket.
    pub async fn lookup(&self, input: &str) -> Result<Option<TicketSummary>, StoreError> {
        let Ok(code) = TicketCode::parse(input) else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_issued_ticket_by_code(code.as_str())
            .await?
            .map(TicketSummary::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ticket(code: &str) -> IssuedTicket {
        IssuedTicket {
            order_id: "ORD-1".to_string(),
            event_id: 3,
            ticket_type_id: 7,
            ticket_code: code.to_string(),
            ticket_name: "VIP".to_string(),
            unit_price: Decimal::new(25000, 2),
            customer_name: Some("Ana".to_string()),
            validated_at: None,
        }
    }

    async fn engine_with(tickets: &[IssuedTicket]) -> ValidationEngine {
        let store = Arc::new(MemoryStore::new());
        store.insert_issued_tickets(tickets).await.unwrap();
        ValidationEngine::new(store)
    }

    #[tokio::test]
    async fn test_validate_admits_once() {
        let engine = engine_with(&[ticket("TKT-3-ABC123-0")]).await;

        let first = engine.validate("TKT-3-ABC123-0").await.unwrap();
        assert!(first.admitted);
        assert_eq!(first.reason, ValidationReason::Admitted);
        let summary = first.ticket.unwrap();
        assert_eq!(summary.customer_name.as_deref(), Some("Ana"));
        assert_eq!(summary.ticket_name, "VIP");
        assert_eq!(summary.order_id, "ORD-1");
        assert_eq!(summary.unit_price, Decimal::new(25000, 2));
        assert_eq!(summary.state, TicketState::Validated);

        let second = engine.validate("TKT-3-ABC123-0").await.unwrap();
        assert!(!second.admitted);
        assert_eq!(second.reason, ValidationReason::AlreadyValidated);
        assert_eq!(
            second.ticket.unwrap().validated_at,
            summary.validated_at
        );
    }

    #[tokio::test]
    async fn test_validate_normalizes_typed_input() {
        let engine = engine_with(&[ticket("TKT-3-ABC123-0")]).await;

        let outcome = engine.validate("  tkt-3-abc123-0 ").await.unwrap();
        assert!(outcome.admitted);
    }

    #[tokio::test]
    async fn test_validate_unknown_and_malformed_codes() {
        let engine = engine_with(&[]).await;

        let unknown = engine.validate("TKT-3-ZZZZZZ-9").await.unwrap();
        assert!(!unknown.admitted);
        assert_eq!(unknown.reason, ValidationReason::NotFound);
        assert!(unknown.ticket.is_none());

        let garbage = engine.validate("not a ticket").await.unwrap();
        assert_eq!(garbage.reason, ValidationReason::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_does_not_validate() {
        let engine = engine_with(&[ticket("TKT-3-ABC123-0")]).await;

        let found = engine.lookup("TKT-3-ABC123-0").await.unwrap().unwrap();
        assert_eq!(found.state, TicketState::Unvalidated);

        assert!(engine.validate("TKT-3-ABC123-0").await.unwrap().admitted);
        assert!(engine.lookup("TKT-3-NOPE-0").await.unwrap().is_none());
    }
}
