use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::customer::CustomerDetails;

/// Upper bound on tickets in one order, checked before the order is
/// committed.
pub const MAX_UNITS_PER_ORDER: i64 = 100;

/// Payment label recorded on the order. No settlement happens behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pix" => Ok(PaymentMethod::Pix),
            "card" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing identifier printed on receipts and tickets.
    pub order_id: String,
    pub customer_id: i64,
    pub event_id: i64,
    /// Snapshot of the buyer's name at purchase time.
    pub customer_name: Option<String>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// "N units of ticket type T purchased in order O". Name and price are
/// frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderLineItem {
    pub order_id: String,
    pub ticket_type_id: i64,
    pub ticket_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLineItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub line_items: Vec<OrderLineItem>,
}

/// An order ready to be committed together with its line items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub customer_id: i64,
    pub event_id: i64,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub line_items: Vec<OrderLineItem>,
}

impl NewOrder {
    pub fn total(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.subtotal()?))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub ticket_type_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub event_id: i64,
    pub customer: CustomerDetails,
    pub items: Vec<CheckoutItem>,
    pub payment_method: PaymentMethod,
}
