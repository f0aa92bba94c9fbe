//! Driving port for invoice operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, CustomerId, DisplayFields, Error, Invoice, InvoiceId, InvoiceStatus, MonthYear, RoomId,
};

/// Request to raise an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Billed room.
    pub room_id: RoomId,
    /// Billing period.
    pub month_year: MonthYear,
    /// Amount due; must be positive.
    pub amount: Amount,
    /// Last day for payment.
    pub due_date: NaiveDate,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to amend an unpaid invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    /// Amount due; must be positive.
    pub amount: Amount,
    /// Last day for payment.
    pub due_date: NaiveDate,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Selection applied when listing invoices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InvoiceQuery {
    /// Every invoice.
    #[default]
    All,
    /// Invoices of one customer.
    Customer(CustomerId),
    /// Invoices of one room.
    Room(RoomId),
    /// Invoices whose effective status matches.
    Status(InvoiceStatus),
    /// Invoices for one billing period.
    Month(MonthYear),
    /// Pending invoices past their due date.
    Overdue,
    /// Case-insensitive match on invoice number or billing period.
    Search(String),
}

/// An invoice as observed today, decorated with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    /// The invoice with its effective status.
    #[serde(flatten)]
    pub invoice: Invoice,
    /// Best-effort display fields.
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// Invoice operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceLifecycle: Send + Sync {
    /// Raise a new Pending invoice.
    async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<InvoiceView, Error>;

    /// Amend an unpaid invoice.
    async fn update_invoice(
        &self,
        id: InvoiceId,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceView, Error>;

    /// Set an unpaid invoice to Pending or Cancelled.
    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<InvoiceView, Error>;

    /// Delete an unpaid invoice.
    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), Error>;

    /// Fetch one invoice.
    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceView, Error>;

    /// Fetch one invoice by number.
    async fn get_invoice_by_number(&self, invoice_number: &str) -> Result<InvoiceView, Error>;

    /// Invoices selected by `query`, in creation order.
    async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<InvoiceView>, Error>;
}
