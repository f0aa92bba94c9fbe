//! Driving port for payment operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, CustomerId, DisplayFields, Error, InvoiceId, MonthYear, Payment, PaymentId,
    PaymentMethod, RoomId,
};

use super::PaymentFilter;

/// Request to settle an invoice in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayInvoiceRequest {
    /// Payment channel.
    pub method: PaymentMethod,
    /// External reference.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to record a payment, optionally settling an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Invoice to settle.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Room paid for.
    pub room_id: RoomId,
    /// Amount received; must be positive.
    pub amount: Amount,
    /// Payment channel.
    pub method: PaymentMethod,
    /// External reference.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Billing period covered.
    pub month_year: MonthYear,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to amend payment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    /// Payment channel.
    pub method: PaymentMethod,
    /// External reference.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Replacement notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A payment decorated with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    /// The payment record.
    #[serde(flatten)]
    pub payment: Payment,
    /// Best-effort display fields.
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// Payment operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentLifecycle: Send + Sync {
    /// Settle an invoice with a payment for its full amount.
    async fn pay_invoice(
        &self,
        invoice_id: InvoiceId,
        request: PayInvoiceRequest,
    ) -> Result<PaymentView, Error>;

    /// Record a payment.
    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentView, Error>;

    /// Amend payment metadata.
    async fn update_payment(
        &self,
        id: PaymentId,
        request: UpdatePaymentRequest,
    ) -> Result<PaymentView, Error>;

    /// Delete a payment, reopening its invoice.
    async fn delete_payment(&self, id: PaymentId) -> Result<(), Error>;

    /// Fetch one payment.
    async fn get_payment(&self, id: PaymentId) -> Result<PaymentView, Error>;

    /// Payments selected by `filter`, in creation order.
    async fn list_payments(&self, filter: PaymentFilter) -> Result<Vec<PaymentView>, Error>;
}
