use corral_data::{Entity, EntityMeta};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A stored customer, serialized as `{id, createdAt, updatedAt, name}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
}

/// Fields a caller supplies when creating a customer.
#[derive(Clone, Debug)]
pub struct NewCustomer {
    pub name: String,
}

/// Partial update: `None` leaves the field as it is.
#[derive(Clone, Debug, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
}

impl Entity for Customer {
    type Draft = NewCustomer;
    type Patch = CustomerPatch;

    fn build(meta: EntityMeta, draft: NewCustomer) -> Self {
        Customer {
            meta,
            name: draft.name,
        }
    }

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply(&mut self, patch: CustomerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

/// Body of `POST /customers`.
///
/// Call [`normalized`](Self::normalized) before validating so that a
/// whitespace-only name is rejected as empty.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    #[garde(length(min = 1, max = 200))]
    pub name: String,
}

impl CreateCustomerRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(req: CreateCustomerRequest) -> Self {
        NewCustomer { name: req.name }
    }
}

/// Body of `PUT /customers/{id}`.
///
/// Unknown fields, including `id`, `createdAt` and `updatedAt`, are ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[serde(default)]
    #[garde(length(min = 1, max = 200))]
    pub name: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self
    }
}

impl From<UpdateCustomerRequest> for CustomerPatch {
    fn from(req: UpdateCustomerRequest) -> Self {
        CustomerPatch { name: req.name }
    }
}
