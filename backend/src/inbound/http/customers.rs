//! Customer HTTP handlers.
//!
//! ```text
//! GET  /api/v1/customers/{id}  Fetch a customer
//! POST /api/v1/customers       Register a customer
//! ```
//!
//! Customer records belong to the customer directory; these endpoints expose
//! it so remote orchestrators can resolve customers over HTTP.

use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::domain::ports::DirectoryError;
use crate::domain::{Customer, CustomerDraft, CustomerId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

fn directory_unavailable(error: DirectoryError) -> Error {
    Error::service_unavailable(error.to_string())
}

fn validate(draft: CustomerDraft) -> Result<CustomerDraft, Error> {
    let full_name = draft.full_name.trim();
    if full_name.is_empty() {
        return Err(Error::invalid_request("fullName must not be blank")
            .with_details(json!({ "field": "fullName" })));
    }
    Ok(CustomerDraft {
        full_name: full_name.to_owned(),
        ..draft
    })
}

/// Fetch one customer by id.
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    id: web::Path<CustomerId>,
) -> ApiResult<web::Json<Customer>> {
    let id = id.into_inner();
    state
        .customers
        .get_by_id(id)
        .await
        .map_err(directory_unavailable)?
        .map(web::Json)
        .ok_or_else(|| {
            Error::not_found(format!("customer {id} not found"))
                .with_details(json!({ "customerId": id }))
        })
}

/// Register a customer.
#[post("/customers")]
pub async fn register_customer(
    state: web::Data<HttpState>,
    payload: web::Json<CustomerDraft>,
) -> ApiResult<HttpResponse> {
    let draft = validate(payload.into_inner())?;
    let customer = state
        .customer_registry
        .register(draft)
        .await
        .map_err(directory_unavailable)?;
    Ok(HttpResponse::Created().json(customer))
}
