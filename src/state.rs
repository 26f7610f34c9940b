use std::sync::Arc;

use crate::services::CheckoutService;
use crate::store::RecordStore;
use crate::ticketing::{IssuanceEngine, ValidationEngine};

/// Shared handler state. Every component talks to the same injected store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub issuance: IssuanceEngine,
    pub validation: ValidationEngine,
    pub checkout: CheckoutService,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let issuance = IssuanceEngine::new(Arc::clone(&store));
        Self {
            validation: ValidationEngine::new(Arc::clone(&store)),
            checkout: CheckoutService::new(Arc::clone(&store), issuance.clone()),
            issuance,
            store,
        }
    }
}
