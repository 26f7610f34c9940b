use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("invalid ticket code input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("invalid issuance input: {0}")]
    InvalidInput(String),

    #[error("order '{0}' not found")]
    OrderNotFound(String),

    /// The store rejected the batch. The order stays valid and issuance can
    /// be retried on its own.
    #[error("issuance failed for order '{order_id}'")]
    IssuanceFailed {
        order_id: String,
        #[source]
        source: StoreError,
    },

    /// A code collided and the stored tickets for the order do not match
    /// the set issuance would produce.
    #[error("duplicate ticket code conflict for order '{order_id}': {detail}")]
    DuplicateCodeConflict { order_id: String, detail: String },
}

impl From<CodeError> for IssuanceError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::InvalidInput(msg) => IssuanceError::InvalidInput(msg),
        }
    }
}
