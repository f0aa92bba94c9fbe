//! Payment HTTP handlers.
//!
//! ```text
//! POST   /api/v1/payments        Record a payment, optionally settling an invoice
//! GET    /api/v1/payments        List payments
//! GET    /api/v1/payments/{id}   Fetch a payment
//! PUT    /api/v1/payments/{id}   Edit method, reference or notes
//! DELETE /api/v1/payments/{id}   Delete a payment, reopening its invoice
//! ```
//!
//! The listing takes one of `invoiceId`, `customerId`, `roomId`, `method`,
//! `monthYear`, or the `from`/`to` pair bounding the payment date.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::domain::ports::{
    CreatePaymentRequest, PaymentFilter, PaymentView, UpdatePaymentRequest,
};
use crate::domain::{CustomerId, Error, InvoiceId, MonthYear, PaymentId, PaymentMethod, RoomId};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, at_most_one_filter};

/// Query accepted by the payment listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    /// Invoice to match.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Customer to match.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Room to match.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Payment method to match.
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    /// Billing period to match.
    #[serde(default)]
    pub month_year: Option<MonthYear>,
    /// Earliest payment time, inclusive.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Latest payment time, inclusive.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl PaymentListQuery {
    fn into_filter(self) -> Result<PaymentFilter, Error> {
        let window = match (self.from, self.to) {
            (Some(from), Some(to)) if from <= to => Some((from, to)),
            (None, None) => None,
            (Some(from), Some(to)) => {
                return Err(Error::invalid_request("from must not be after to")
                    .with_details(json!({ "from": from, "to": to })));
            }
            _ => {
                return Err(Error::invalid_request("from and to must be given together")
                    .with_details(json!({ "fields": ["from", "to"] })));
            }
        };
        at_most_one_filter(&[
            ("invoiceId", self.invoice_id.is_some()),
            ("customerId", self.customer_id.is_some()),
            ("roomId", self.room_id.is_some()),
            ("method", self.method.is_some()),
            ("monthYear", self.month_year.is_some()),
            ("from/to", window.is_some()),
        ])?;
        let filter = if let Some(invoice_id) = self.invoice_id {
            PaymentFilter::Invoice(invoice_id)
        } else if let Some(customer_id) = self.customer_id {
            PaymentFilter::Customer(customer_id)
        } else if let Some(room_id) = self.room_id {
            PaymentFilter::Room(room_id)
        } else if let Some(method) = self.method {
            PaymentFilter::Method(method)
        } else if let Some(month_year) = self.month_year {
            PaymentFilter::Month(month_year)
        } else if let Some((from, to)) = window {
            PaymentFilter::PaidBetween { from, to }
        } else {
            PaymentFilter::All
        };
        Ok(filter)
    }
}

/// Record a payment against an unpaid invoice.
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<HttpState>,
    payload: web::Json<CreatePaymentRequest>,
) -> ApiResult<HttpResponse> {
    let view = state.payments.create_payment(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// List payments, optionally filtered.
#[get("/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    query: web::Query<PaymentListQuery>,
) -> ApiResult<web::Json<Vec<PaymentView>>> {
    let filter = query.into_inner().into_filter()?;
    Ok(web::Json(state.payments.list_payments(filter).await?))
}

/// Fetch one payment by id.
#[get("/payments/{id}")]
pub async fn get_payment(
    state: web::Data<HttpState>,
    id: web::Path<PaymentId>,
) -> ApiResult<web::Json<PaymentView>> {
    Ok(web::Json(state.payments.get_payment(id.into_inner()).await?))
}

/// Amend a payment's method or reference.
#[put("/payments/{id}")]
pub async fn update_payment(
    state: web::Data<HttpState>,
    id: web::Path<PaymentId>,
    payload: web::Json<UpdatePaymentRequest>,
) -> ApiResult<web::Json<PaymentView>> {
    let view = state
        .payments
        .update_payment(id.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(view))
}

/// Delete a payment.
#[delete("/payments/{id}")]
pub async fn delete_payment(
    state: web::Data<HttpState>,
    id: web::Path<PaymentId>,
) -> ApiResult<HttpResponse> {
    state.payments.delete_payment(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
