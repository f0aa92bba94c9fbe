//! Port for invoice and payment persistence.
//!
//! Invoices and payments live in one store so that settling an invoice and
//! recording its payment, or deleting a payment and reopening its invoice,
//! happen as single atomic operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CustomerId, Invoice, InvoiceDraft, InvoiceId, InvoiceStatus, MonthYear, Payment,
    PaymentDraft, PaymentId, PaymentMethod, RoomId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by billing repository adapters.
    pub enum BillingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "billing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "billing repository query failed: {message}",
        /// Another invoice already uses this number.
        NumberTaken { invoice_number: String } =>
            "invoice number {invoice_number} is already in use",
        /// An open invoice already covers this customer, room and period.
        OpenInvoiceExists { customer_id: CustomerId, room_id: RoomId, month_year: MonthYear } =>
            "customer {customer_id} already has an open invoice for room {room_id} in {month_year}",
        /// The invoice does not exist.
        InvoiceMissing { invoice_id: InvoiceId } =>
            "invoice {invoice_id} does not exist",
        /// The invoice is paid and can no longer change.
        InvoiceSettled { invoice_id: InvoiceId } =>
            "invoice {invoice_id} is already paid",
        /// The invoice cannot take a payment in its current status.
        NotPayable { invoice_id: InvoiceId, status: InvoiceStatus } =>
            "invoice {invoice_id} cannot be paid while {status}",
        /// The payment does not exist.
        PaymentMissing { payment_id: PaymentId } =>
            "payment {payment_id} does not exist",
    }
}

/// Structural selection applied when listing invoices.
///
/// Filters on the stored status only; overdue selection happens in the
/// billing service, which knows today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvoiceFilter {
    /// Every invoice.
    #[default]
    All,
    /// Invoices of one customer.
    Customer(CustomerId),
    /// Invoices of one room.
    Room(RoomId),
    /// Invoices for one billing period.
    Month(MonthYear),
    /// Invoices with one stored status.
    StoredStatus(InvoiceStatus),
}

impl InvoiceFilter {
    /// True when `invoice` is selected by this filter.
    #[must_use]
    pub fn matches(&self, invoice: &Invoice) -> bool {
        match *self {
            Self::All => true,
            Self::Customer(customer_id) => invoice.customer_id == customer_id,
            Self::Room(room_id) => invoice.room_id == room_id,
            Self::Month(month_year) => invoice.month_year == month_year,
            Self::StoredStatus(status) => invoice.status == status,
        }
    }
}

/// Selection applied when listing payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFilter {
    /// Every payment.
    #[default]
    All,
    /// Payments settling one invoice.
    Invoice(InvoiceId),
    /// Payments by one customer.
    Customer(CustomerId),
    /// Payments for one room.
    Room(RoomId),
    /// Payments made through one channel.
    Method(PaymentMethod),
    /// Payments covering one billing period.
    Month(MonthYear),
    /// Payments recorded within `[from, to]`.
    PaidBetween {
        /// Inclusive lower bound.
        from: DateTime<Utc>,
        /// Inclusive upper bound.
        to: DateTime<Utc>,
    },
}

impl PaymentFilter {
    /// True when `payment` is selected by this filter.
    #[must_use]
    pub fn matches(&self, payment: &Payment) -> bool {
        match *self {
            Self::All => true,
            Self::Invoice(invoice_id) => payment.invoice_id == Some(invoice_id),
            Self::Customer(customer_id) => payment.customer_id == customer_id,
            Self::Room(room_id) => payment.room_id == room_id,
            Self::Method(method) => payment.method == method,
            Self::Month(month_year) => payment.month_year == month_year,
            Self::PaidBetween { from, to } => {
                payment.payment_date >= from && payment.payment_date <= to
            }
        }
    }
}

/// A deleted payment and the invoice it reopened, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedPayment {
    /// The payment as it was before deletion.
    pub payment: Payment,
    /// The linked invoice after reverting to Pending.
    pub reopened: Option<Invoice>,
}

/// Port for storing invoices and payments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Persist a Pending invoice.
    ///
    /// Fails with `NumberTaken` on a number collision and with
    /// `OpenInvoiceExists` when a Pending invoice already covers the same
    /// customer, room and period.
    async fn insert_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, BillingRepositoryError>;

    /// Find an invoice by id.
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, BillingRepositoryError>;

    /// Find an invoice by its number.
    async fn find_invoice_by_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, BillingRepositoryError>;

    /// Overwrite an invoice unless the stored copy is Paid.
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), BillingRepositoryError>;

    /// Remove an invoice unless it is Paid; `false` when it did not exist.
    async fn delete_invoice(&self, id: InvoiceId) -> Result<bool, BillingRepositoryError>;

    /// Invoices selected by `filter`, in creation order.
    async fn list_invoices(
        &self,
        filter: InvoiceFilter,
    ) -> Result<Vec<Invoice>, BillingRepositoryError>;

    /// Atomically check the invoice accepts payment, record the payment and
    /// mark the invoice Paid.
    async fn settle_invoice(
        &self,
        invoice_id: InvoiceId,
        draft: PaymentDraft,
    ) -> Result<(Invoice, Payment), BillingRepositoryError>;

    /// Record a payment not linked to any invoice.
    async fn insert_payment(&self, draft: PaymentDraft) -> Result<Payment, BillingRepositoryError>;

    /// Find a payment by id.
    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>, BillingRepositoryError>;

    /// Overwrite an existing payment.
    async fn update_payment(&self, payment: &Payment) -> Result<(), BillingRepositoryError>;

    /// Atomically delete a payment and revert its invoice to Pending.
    async fn delete_payment(
        &self,
        id: PaymentId,
    ) -> Result<Option<RemovedPayment>, BillingRepositoryError>;

    /// Payments selected by `filter`, in creation order.
    async fn list_payments(
        &self,
        filter: PaymentFilter,
    ) -> Result<Vec<Payment>, BillingRepositoryError>;
}
