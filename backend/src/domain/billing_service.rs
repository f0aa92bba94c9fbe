//! Billing orchestration for invoices and payments.
//!
//! Billing never touches room status. It reads the directories to validate
//! references and decorate views. Overdue is derived on every read from the
//! due date and never stored.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::booking_service::normalise_notes;
use crate::domain::ports::{
    BillingRepository, BillingRepositoryError, CreateInvoiceRequest, CreatePaymentRequest,
    InvoiceFilter, InvoiceLifecycle, InvoiceQuery, InvoiceView, PayInvoiceRequest, PaymentFilter,
    PaymentLifecycle, PaymentView, UpdateInvoiceRequest, UpdatePaymentRequest,
};
use crate::domain::{
    Amount, Directories, Enricher, Error, Invoice, InvoiceDraft, InvoiceId, InvoiceNumber,
    InvoiceNumberSource, InvoiceStatus, Payment, PaymentDraft, PaymentId, PaymentRefusal,
};

/// Invoice numbers drawn before giving up on a run of collisions.
const MAX_NUMBER_ATTEMPTS: usize = 5;

fn map_billing_repository_error(error: BillingRepositoryError) -> Error {
    let message = error.to_string();
    match error {
        BillingRepositoryError::Connection { .. } => Error::service_unavailable(message),
        BillingRepositoryError::Query { .. } => Error::internal(message),
        BillingRepositoryError::NumberTaken { invoice_number } => Error::conflict(message)
            .with_details(json!({ "invoiceNumber": invoice_number })),
        BillingRepositoryError::OpenInvoiceExists {
            customer_id,
            room_id,
            month_year,
        } => Error::duplicate_invoice(message).with_details(json!({
            "customerId": customer_id,
            "roomId": room_id,
            "monthYear": month_year,
        })),
        BillingRepositoryError::InvoiceMissing { invoice_id } => {
            Error::not_found(message).with_details(json!({ "invoiceId": invoice_id }))
        }
        BillingRepositoryError::InvoiceSettled { invoice_id } => Error::invalid_transition(message)
            .with_details(json!({ "invoiceId": invoice_id, "status": InvoiceStatus::Paid })),
        BillingRepositoryError::NotPayable { invoice_id, status } => {
            payment_refused(invoice_id, status)
        }
        BillingRepositoryError::PaymentMissing { payment_id } => {
            Error::not_found(message).with_details(json!({ "paymentId": payment_id }))
        }
    }
}

fn payment_refused(invoice_id: InvoiceId, status: InvoiceStatus) -> Error {
    let details = json!({ "invoiceId": invoice_id, "status": status });
    if status == InvoiceStatus::Paid {
        Error::already_paid(format!("invoice {invoice_id} is already paid")).with_details(details)
    } else {
        Error::invalid_transition(format!("invoice {invoice_id} cannot be paid while {status}"))
            .with_details(details)
    }
}

fn require_positive(amount: Amount) -> Result<(), Error> {
    if amount.is_zero() {
        Err(Error::invalid_request("amount must be greater than zero")
            .with_details(json!({ "field": "amount" })))
    } else {
        Ok(())
    }
}

fn ensure_payable(invoice: &Invoice) -> Result<(), Error> {
    invoice.accepts_payment().map_err(|refusal| {
        let status = match refusal {
            PaymentRefusal::AlreadyPaid => InvoiceStatus::Paid,
            PaymentRefusal::Cancelled => InvoiceStatus::Cancelled,
        };
        payment_refused(invoice.id, status)
    })
}

fn paid_is_immutable(invoice: &Invoice) -> Result<(), Error> {
    if invoice.status == InvoiceStatus::Paid {
        Err(Error::invalid_transition(format!(
            "invoice {} is paid and can no longer change",
            invoice.id
        ))
        .with_details(json!({ "invoiceId": invoice.id, "status": invoice.status })))
    } else {
        Ok(())
    }
}

fn matches_search(invoice: &Invoice, term: &str) -> bool {
    invoice.invoice_number.as_str().to_uppercase().contains(term)
        || invoice.month_year.to_string().contains(term)
}

/// Billing orchestrator.
#[derive(Clone)]
pub struct BillingService {
    billing: Arc<dyn BillingRepository>,
    directories: Directories,
    enricher: Enricher,
    numbers: Arc<dyn InvoiceNumberSource>,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    /// Wire the orchestrator to its store, the directories and a number source.
    pub fn new(
        billing: Arc<dyn BillingRepository>,
        directories: Directories,
        numbers: Arc<dyn InvoiceNumberSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let enricher = directories.enricher();
        Self {
            billing,
            directories,
            enricher,
            numbers,
            clock,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    async fn require_invoice(&self, id: InvoiceId) -> Result<Invoice, Error> {
        self.billing
            .find_invoice(id)
            .await
            .map_err(map_billing_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("invoice {id} not found"))
                    .with_details(json!({ "invoiceId": id }))
            })
    }

    async fn require_payment(&self, id: PaymentId) -> Result<Payment, Error> {
        self.billing
            .find_payment(id)
            .await
            .map_err(map_billing_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("payment {id} not found"))
                    .with_details(json!({ "paymentId": id }))
            })
    }

    async fn insert_with_fresh_number(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<Invoice, Error> {
        let issue_date = self.clock.utc();
        let description = normalise_notes(request.description);
        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let draft = InvoiceDraft {
                invoice_number: self.numbers.next_number(issue_date.date_naive()),
                customer_id: request.customer_id,
                room_id: request.room_id,
                month_year: request.month_year,
                amount: request.amount,
                issue_date,
                due_date: request.due_date,
                description: description.clone(),
            };
            match self.billing.insert_invoice(draft).await {
                Ok(invoice) => return Ok(invoice),
                Err(BillingRepositoryError::NumberTaken { invoice_number }) => {
                    debug!(%invoice_number, attempt, "invoice number collision; drawing another");
                }
                Err(err) => return Err(map_billing_repository_error(err)),
            }
        }
        Err(Error::internal(
            "could not allocate a unique invoice number",
        ))
    }

    async fn invoice_view(&self, invoice: Invoice) -> InvoiceView {
        let display = self
            .enricher
            .describe(invoice.customer_id, invoice.room_id)
            .await
            .into_display();
        InvoiceView {
            invoice: invoice.as_of(self.today()),
            display,
        }
    }

    async fn invoice_number_of(&self, id: InvoiceId) -> Option<InvoiceNumber> {
        match self.billing.find_invoice(id).await {
            Ok(found) => found.map(|invoice| invoice.invoice_number),
            Err(err) => {
                debug!(invoice_id = %id, error = %err, "display enrichment incomplete");
                None
            }
        }
    }

    async fn payment_view(&self, payment: Payment) -> PaymentView {
        let lookup = async {
            match payment.invoice_id {
                Some(id) => self.invoice_number_of(id).await,
                None => None,
            }
        };
        let (enrichment, invoice_number) = tokio::join!(
            self.enricher.describe(payment.customer_id, payment.room_id),
            lookup,
        );
        let mut display = enrichment.into_display();
        display.invoice_number = invoice_number;
        PaymentView { payment, display }
    }

    async fn invoice_views(&self, invoices: Vec<Invoice>) -> Vec<InvoiceView> {
        join_all(invoices.into_iter().map(|invoice| self.invoice_view(invoice))).await
    }

    async fn settle(&self, invoice_id: InvoiceId, draft: PaymentDraft) -> Result<PaymentView, Error> {
        let (invoice, payment) = self
            .billing
            .settle_invoice(invoice_id, draft)
            .await
            .map_err(map_billing_repository_error)?;
        info!(
            invoice_id = %invoice.id,
            payment_id = %payment.id,
            amount = %payment.amount,
            "invoice paid"
        );
        Ok(self.payment_view(payment).await)
    }
}

#[async_trait]
impl InvoiceLifecycle for BillingService {
    async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<InvoiceView, Error> {
        require_positive(request.amount)?;
        self.directories
            .require_customer(request.customer_id)
            .await?;
        self.directories.require_room(request.room_id).await?;

        let invoice = self.insert_with_fresh_number(request).await?;
        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            customer_id = %invoice.customer_id,
            room_id = %invoice.room_id,
            month_year = %invoice.month_year,
            "invoice issued"
        );
        Ok(self.invoice_view(invoice).await)
    }

    async fn update_invoice(
        &self,
        id: InvoiceId,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceView, Error> {
        require_positive(request.amount)?;
        let mut invoice = self.require_invoice(id).await?;
        paid_is_immutable(&invoice)?;
        invoice.amount = request.amount;
        invoice.due_date = request.due_date;
        invoice.description = normalise_notes(request.description);
        self.billing
            .update_invoice(&invoice)
            .await
            .map_err(map_billing_repository_error)?;
        Ok(self.invoice_view(invoice).await)
    }

    async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<InvoiceView, Error> {
        let mut invoice = self.require_invoice(id).await?;
        let refuse = |reason: &str| {
            Error::invalid_transition(format!("invoice {id}: {reason}"))
                .with_details(json!({ "invoiceId": id, "from": invoice.status, "to": status }))
        };
        match status {
            InvoiceStatus::Paid => return Err(refuse("invoices are paid by recording a payment")),
            InvoiceStatus::Overdue => return Err(refuse("overdue follows from the due date")),
            InvoiceStatus::Pending | InvoiceStatus::Cancelled => {}
        }
        if invoice.status == status {
            return Ok(self.invoice_view(invoice).await);
        }
        match invoice.status {
            InvoiceStatus::Paid => return Err(refuse("paid invoices can no longer change")),
            InvoiceStatus::Cancelled => return Err(refuse("cancelled invoices stay cancelled")),
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {}
        }

        invoice.status = status;
        self.billing
            .update_invoice(&invoice)
            .await
            .map_err(map_billing_repository_error)?;
        info!(invoice_id = %id, status = %status, "invoice status changed");
        Ok(self.invoice_view(invoice).await)
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), Error> {
        let invoice = self.require_invoice(id).await?;
        paid_is_immutable(&invoice)?;
        let removed = self
            .billing
            .delete_invoice(id)
            .await
            .map_err(map_billing_repository_error)?;
        if !removed {
            return Err(Error::not_found(format!("invoice {id} not found"))
                .with_details(json!({ "invoiceId": id })));
        }
        info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceView, Error> {
        let invoice = self.require_invoice(id).await?;
        Ok(self.invoice_view(invoice).await)
    }

    async fn get_invoice_by_number(&self, invoice_number: &str) -> Result<InvoiceView, Error> {
        let invoice = self
            .billing
            .find_invoice_by_number(invoice_number.trim())
            .await
            .map_err(map_billing_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("invoice {invoice_number} not found"))
                    .with_details(json!({ "invoiceNumber": invoice_number }))
            })?;
        Ok(self.invoice_view(invoice).await)
    }

    async fn list_invoices(&self, query: InvoiceQuery) -> Result<Vec<InvoiceView>, Error> {
        let today = self.today();
        let filter = match query {
            InvoiceQuery::Customer(id) => InvoiceFilter::Customer(id),
            InvoiceQuery::Room(id) => InvoiceFilter::Room(id),
            InvoiceQuery::Month(month_year) => InvoiceFilter::Month(month_year),
            InvoiceQuery::All
            | InvoiceQuery::Status(_)
            | InvoiceQuery::Overdue
            | InvoiceQuery::Search(_) => InvoiceFilter::All,
        };
        let invoices = self
            .billing
            .list_invoices(filter)
            .await
            .map_err(map_billing_repository_error)?;
        let selected = match query {
            InvoiceQuery::Status(status) => invoices
                .into_iter()
                .filter(|invoice| invoice.effective_status(today) == status)
                .collect(),
            InvoiceQuery::Overdue => invoices
                .into_iter()
                .filter(|invoice| invoice.effective_status(today) == InvoiceStatus::Overdue)
                .collect(),
            InvoiceQuery::Search(term) => {
                let term = term.trim().to_uppercase();
                invoices
                    .into_iter()
                    .filter(|invoice| matches_search(invoice, &term))
                    .collect()
            }
            InvoiceQuery::All
            | InvoiceQuery::Customer(_)
            | InvoiceQuery::Room(_)
            | InvoiceQuery::Month(_) => invoices,
        };
        Ok(self.invoice_views(selected).await)
    }
}

#[async_trait]
impl PaymentLifecycle for BillingService {
    async fn pay_invoice(
        &self,
        invoice_id: InvoiceId,
        request: PayInvoiceRequest,
    ) -> Result<PaymentView, Error> {
        let invoice = self.require_invoice(invoice_id).await?;
        ensure_payable(&invoice)?;
        let draft = PaymentDraft {
            invoice_id: Some(invoice.id),
            customer_id: invoice.customer_id,
            room_id: invoice.room_id,
            amount: invoice.amount,
            payment_date: self.clock.utc(),
            method: request.method,
            transaction_id: normalise_notes(request.transaction_id),
            month_year: invoice.month_year,
            notes: normalise_notes(request.notes),
        };
        self.settle(invoice.id, draft).await
    }

    async fn create_payment(&self, request: CreatePaymentRequest) -> Result<PaymentView, Error> {
        require_positive(request.amount)?;
        self.directories
            .require_customer(request.customer_id)
            .await?;
        self.directories.require_room(request.room_id).await?;
        let draft = PaymentDraft {
            invoice_id: request.invoice_id,
            customer_id: request.customer_id,
            room_id: request.room_id,
            amount: request.amount,
            payment_date: self.clock.utc(),
            method: request.method,
            transaction_id: normalise_notes(request.transaction_id),
            month_year: request.month_year,
            notes: normalise_notes(request.notes),
        };

        let Some(invoice_id) = request.invoice_id else {
            let payment = self
                .billing
                .insert_payment(draft)
                .await
                .map_err(map_billing_repository_error)?;
            info!(payment_id = %payment.id, amount = %payment.amount, "payment recorded");
            return Ok(self.payment_view(payment).await);
        };

        let invoice = self.require_invoice(invoice_id).await?;
        if invoice.customer_id != request.customer_id || invoice.room_id != request.room_id {
            return Err(Error::invalid_request(format!(
                "invoice {invoice_id} belongs to a different customer or room"
            ))
            .with_details(json!({
                "invoiceId": invoice_id,
                "customerId": invoice.customer_id,
                "roomId": invoice.room_id,
            })));
        }
        ensure_payable(&invoice)?;
        self.settle(invoice_id, draft).await
    }

    async fn update_payment(
        &self,
        id: PaymentId,
        request: UpdatePaymentRequest,
    ) -> Result<PaymentView, Error> {
        let mut payment = self.require_payment(id).await?;
        payment.method = request.method;
        payment.transaction_id = normalise_notes(request.transaction_id);
        payment.notes = normalise_notes(request.notes);
        self.billing
            .update_payment(&payment)
            .await
            .map_err(map_billing_repository_error)?;
        Ok(self.payment_view(payment).await)
    }

    async fn delete_payment(&self, id: PaymentId) -> Result<(), Error> {
        let removed = self
            .billing
            .delete_payment(id)
            .await
            .map_err(map_billing_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("payment {id} not found"))
                    .with_details(json!({ "paymentId": id }))
            })?;
        match removed.reopened {
            Some(invoice) => info!(
                payment_id = %id,
                invoice_id = %invoice.id,
                "payment deleted; invoice reopened"
            ),
            None => info!(payment_id = %id, "payment deleted"),
        }
        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<PaymentView, Error> {
        let payment = self.require_payment(id).await?;
        Ok(self.payment_view(payment).await)
    }

    async fn list_payments(&self, filter: PaymentFilter) -> Result<Vec<PaymentView>, Error> {
        let payments = self
            .billing
            .list_payments(filter)
            .await
            .map_err(map_billing_repository_error)?;
        Ok(join_all(payments.into_iter().map(|payment| self.payment_view(payment))).await)
    }
}

#[cfg(test)]
#[path = "billing_service_tests.rs"]
mod tests;
