//! Invoice HTTP handlers.
//!
//! ```text
//! GET    /api/v1/invoices/number/{number}  Find an invoice by number
//! POST   /api/v1/invoices                  Raise an invoice
//! GET    /api/v1/invoices                  List invoices
//! GET    /api/v1/invoices/{id}             Fetch an invoice
//! PUT    /api/v1/invoices/{id}             Edit amount, due date or description
//! PUT    /api/v1/invoices/{id}/status      Cancel or reopen an invoice
//! DELETE /api/v1/invoices/{id}             Delete an unpaid invoice
//! POST   /api/v1/invoices/{id}/pay         Settle an invoice with one payment
//! ```
//!
//! Statuses in responses are derived: a pending invoice past its due date
//! reads as `OVERDUE`.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

use crate::domain::ports::{
    CreateInvoiceRequest, InvoiceQuery, InvoiceView, PayInvoiceRequest, UpdateInvoiceRequest,
};
use crate::domain::{CustomerId, Error, InvoiceId, InvoiceStatus, MonthYear, RoomId};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, StatusBody, at_most_one_filter};

/// Query accepted by the invoice listing; at most one field may be set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    /// Customer to match.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Room to match.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Status to match.
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    /// Billing period to match.
    #[serde(default)]
    pub month_year: Option<MonthYear>,
    /// `true` lists invoices that are overdue today.
    #[serde(default)]
    pub overdue: bool,
    /// Case-insensitive match on invoice number or billing period.
    #[serde(default)]
    pub search: Option<String>,
}

impl InvoiceListQuery {
    fn into_query(self) -> Result<InvoiceQuery, Error> {
        let search = self
            .search
            .map(|term| term.trim().to_owned())
            .filter(|term| !term.is_empty());
        at_most_one_filter(&[
            ("customerId", self.customer_id.is_some()),
            ("roomId", self.room_id.is_some()),
            ("status", self.status.is_some()),
            ("monthYear", self.month_year.is_some()),
            ("overdue", self.overdue),
            ("search", search.is_some()),
        ])?;
        let query = if let Some(customer_id) = self.customer_id {
            InvoiceQuery::Customer(customer_id)
        } else if let Some(room_id) = self.room_id {
            InvoiceQuery::Room(room_id)
        } else if let Some(status) = self.status {
            InvoiceQuery::Status(status)
        } else if let Some(month_year) = self.month_year {
            InvoiceQuery::Month(month_year)
        } else if self.overdue {
            InvoiceQuery::Overdue
        } else if let Some(term) = search {
            InvoiceQuery::Search(term)
        } else {
            InvoiceQuery::All
        };
        Ok(query)
    }
}

/// Fetch one invoice by its number.
#[get("/invoices/number/{invoice_number}")]
pub async fn get_invoice_by_number(
    state: web::Data<HttpState>,
    invoice_number: web::Path<String>,
) -> ApiResult<web::Json<InvoiceView>> {
    let view = state.invoices.get_invoice_by_number(&invoice_number).await?;
    Ok(web::Json(view))
}

/// Issue an invoice with a generated number.
#[post("/invoices")]
pub async fn create_invoice(
    state: web::Data<HttpState>,
    payload: web::Json<CreateInvoiceRequest>,
) -> ApiResult<HttpResponse> {
    let view = state.invoices.create_invoice(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// List invoices, optionally filtered.
#[get("/invoices")]
pub async fn list_invoices(
    state: web::Data<HttpState>,
    query: web::Query<InvoiceListQuery>,
) -> ApiResult<web::Json<Vec<InvoiceView>>> {
    let query = query.into_inner().into_query()?;
    Ok(web::Json(state.invoices.list_invoices(query).await?))
}

/// Fetch one invoice by id.
#[get("/invoices/{id}")]
pub async fn get_invoice(
    state: web::Data<HttpState>,
    id: web::Path<InvoiceId>,
) -> ApiResult<web::Json<InvoiceView>> {
    Ok(web::Json(state.invoices.get_invoice(id.into_inner()).await?))
}

/// Amend an invoice.
#[put("/invoices/{id}")]
pub async fn update_invoice(
    state: web::Data<HttpState>,
    id: web::Path<InvoiceId>,
    payload: web::Json<UpdateInvoiceRequest>,
) -> ApiResult<web::Json<InvoiceView>> {
    let view = state
        .invoices
        .update_invoice(id.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(view))
}

/// Move an invoice through its status lifecycle.
#[put("/invoices/{id}/status")]
pub async fn update_invoice_status(
    state: web::Data<HttpState>,
    id: web::Path<InvoiceId>,
    payload: web::Json<StatusBody<InvoiceStatus>>,
) -> ApiResult<web::Json<InvoiceView>> {
    let view = state
        .invoices
        .update_invoice_status(id.into_inner(), payload.status)
        .await?;
    Ok(web::Json(view))
}

/// Delete an invoice.
#[delete("/invoices/{id}")]
pub async fn delete_invoice(
    state: web::Data<HttpState>,
    id: web::Path<InvoiceId>,
) -> ApiResult<HttpResponse> {
    state.invoices.delete_invoice(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record the single payment that settles an invoice.
#[post("/invoices/{id}/pay")]
pub async fn pay_invoice(
    state: web::Data<HttpState>,
    id: web::Path<InvoiceId>,
    payload: web::Json<PayInvoiceRequest>,
) -> ApiResult<HttpResponse> {
    let view = state
        .payments
        .pay_invoice(id.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(view))
}
