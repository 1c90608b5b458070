use std::sync::Arc;

use corral_core::HttpError;
use corral_data::{DataError, InMemoryRepository, Repository};

use crate::models::{Customer, CustomerPatch, NewCustomer};

/// Errors raised by [`CustomerService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Another customer already uses this name.
    DuplicateName(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::DuplicateName(name) => {
                write!(f, "Customer name already exists: {name}")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::DuplicateName(_) => HttpError::Conflict(err.to_string()),
        }
    }
}

/// Customer business rules on top of the shared repository.
///
/// Names are unique across customers; the check runs under the repository
/// lock, so two concurrent creates with the same name cannot both succeed.
#[derive(Clone)]
pub struct CustomerService {
    repo: Arc<InMemoryRepository<Customer>>,
}

impl CustomerService {
    pub fn new(repo: Arc<InMemoryRepository<Customer>>) -> Self {
        Self { repo }
    }

    pub fn create_customer(&self, draft: NewCustomer) -> Result<Customer, ServiceError> {
        let name = draft.name.clone();
        self.repo
            .create_unique(draft, |existing| existing.name == name)
            .map_err(|DataError::Conflict(_)| ServiceError::DuplicateName(name.clone()))
    }

    pub fn get_all_customers(&self) -> Vec<Customer> {
        self.repo.get_all()
    }

    pub fn get_customer_by_id(&self, id: u64) -> Option<Customer> {
        self.repo.get_by_id(id)
    }

    /// `Ok(None)` when there is no customer with `id`.
    pub fn update_customer(
        &self,
        id: u64,
        patch: CustomerPatch,
    ) -> Result<Option<Customer>, ServiceError> {
        let Some(name) = patch.name.clone() else {
            return Ok(self.repo.update(id, patch));
        };
        self.repo
            .update_unique(id, patch, |existing| existing.name == name)
            .map_err(|DataError::Conflict(_)| ServiceError::DuplicateName(name.clone()))
    }

    pub fn delete_customer(&self, id: u64) -> bool {
        self.repo.delete(id)
    }
}
