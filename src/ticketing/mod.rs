//! Ticket issuance and gate validation.

pub mod code;
pub mod error;
pub mod issuance;
pub mod validation;

pub use code::{generate, TicketCode};
pub use error::{CodeError, IssuanceError};
pub use issuance::{Issuance, IssuanceEngine, IssuanceStatus};
pub use validation::{TicketSummary, ValidationEngine, ValidationOutcome, ValidationReason};
