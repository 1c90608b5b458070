use std::sync::Arc;

use corral_data::InMemoryRepository;

use crate::services::CustomerService;

/// Application state controllers are built from.
#[derive(Clone)]
pub struct Services {
    pub customer_service: CustomerService,
}

impl Services {
    /// Fresh state with an empty customer repository.
    pub fn new() -> Self {
        Self {
            customer_service: CustomerService::new(Arc::new(InMemoryRepository::new())),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}
