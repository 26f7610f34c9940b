use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One admit-one unit derived from a purchased line item.
///
/// `validated_at` is the only field mutated after issuance and it moves at
/// most once, from `None` to the redemption time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct IssuedTicket {
    pub order_id: String,
    pub event_id: i64,
    pub ticket_type_id: i64,
    pub ticket_code: String,
    pub ticket_name: String,
    pub unit_price: Decimal,
    pub customer_name: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Unvalidated,
    Validated,
}

impl IssuedTicket {
    pub fn state(&self) -> TicketState {
        match self.validated_at {
            Some(_) => TicketState::Validated,
            None => TicketState::Unvalidated,
        }
    }
}
