use corral_core::prelude::*;

use crate::models::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::services::CustomerService;
use crate::state::Services;

const NOT_FOUND: &str = "Customer not found";

/// CRUD endpoints under `/customers`.
pub struct CustomerController {
    customers: CustomerService,
}

impl Controller<Services> for CustomerController {
    fn from_state(state: &Services) -> Self {
        Self {
            customers: state.customer_service.clone(),
        }
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_group::<Self>("/customers");
        routes.declare_route::<Self>("create_customer", HttpVerb::Post, "");
        routes.declare_route::<Self>("get_all_customers", HttpVerb::Get, "");
        routes.declare_route::<Self>("get_customer_by_id", HttpVerb::Get, "/{id}");
        routes.declare_route::<Self>("update_customer", HttpVerb::Put, "/{id}");
        routes.declare_route::<Self>("delete_customer", HttpVerb::Delete, "/{id}");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self {
            create_customer,
            get_all_customers,
            get_customer_by_id,
            update_customer,
            delete_customer,
        })
    }
}

impl CustomerController {
    fn create_customer(&self, req: RouteRequest) -> ApiResult<Response> {
        let body = req.json::<CreateCustomerRequest>()?.normalized();
        validate(&body)?;
        let customer = self.customers.create_customer(body.into())?;
        Ok((StatusCode::CREATED, Json(customer)).into_response())
    }

    fn get_all_customers(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok(Json(self.customers.get_all_customers()).into_response())
    }

    fn get_customer_by_id(&self, req: RouteRequest) -> ApiResult<Response> {
        let id: u64 = req.path_param("id")?;
        let customer = self
            .customers
            .get_customer_by_id(id)
            .ok_or_else(|| HttpError::NotFound(NOT_FOUND.into()))?;
        Ok(Json(customer).into_response())
    }

    /// A missing body is an empty patch: only `updatedAt` moves.
    fn update_customer(&self, req: RouteRequest) -> ApiResult<Response> {
        let id: u64 = req.path_param("id")?;
        let body = req.json_or_default::<UpdateCustomerRequest>()?.normalized();
        validate(&body)?;
        let customer = self
            .customers
            .update_customer(id, body.into())?
            .ok_or_else(|| HttpError::NotFound(NOT_FOUND.into()))?;
        Ok(Json(customer).into_response())
    }

    fn delete_customer(&self, req: RouteRequest) -> ApiResult<Response> {
        let id: u64 = req.path_param("id")?;
        if !self.customers.delete_customer(id) {
            return Err(HttpError::NotFound(NOT_FOUND.into()));
        }
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
