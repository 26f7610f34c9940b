pub mod checkout;

pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
