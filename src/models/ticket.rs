use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Prices are kept in currency units with at most this many decimal places.
pub const PRICE_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12, 2)` column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, PRICE_SCALE)
}

/// A priced tier of admission for an event ("VIP", "Pista", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketType {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(rename = "desc")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicketType {
    pub name: String,
    pub price: Decimal,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
}

impl NewTicketType {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Ticket type name is required".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("Ticket price must not be negative".to_string());
        }
        if self.price > max_amount() {
            return Err(format!("Ticket price must not exceed {}", max_amount()));
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(format!(
                "Ticket price must have at most {} decimal places",
                PRICE_SCALE
            ));
        }
        Ok(())
    }
}
