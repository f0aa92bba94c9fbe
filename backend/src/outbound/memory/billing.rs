//! In-memory invoice and payment store.
//!
//! Invoices and payments sit behind one lock so settling an invoice with its
//! payment, and deleting a payment while reopening its invoice, are atomic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::POISONED;
use crate::domain::ports::{
    BillingRepository, BillingRepositoryError, InvoiceFilter, PaymentFilter, RemovedPayment,
};
use crate::domain::{
    Invoice, InvoiceDraft, InvoiceId, InvoiceStatus, Payment, PaymentDraft, PaymentId,
};

#[derive(Default)]
struct Ledger {
    last_invoice_id: u64,
    last_payment_id: u64,
    invoices: BTreeMap<u64, Invoice>,
    payments: BTreeMap<u64, Payment>,
}

impl Ledger {
    fn next_invoice_id(&mut self) -> InvoiceId {
        self.last_invoice_id = self.last_invoice_id.saturating_add(1);
        InvoiceId::new(self.last_invoice_id)
    }

    fn next_payment_id(&mut self) -> PaymentId {
        self.last_payment_id = self.last_payment_id.saturating_add(1);
        PaymentId::new(self.last_payment_id)
    }

    fn invoice_mut(&mut self, id: InvoiceId) -> Result<&mut Invoice, BillingRepositoryError> {
        self.invoices
            .get_mut(&id.get())
            .ok_or_else(|| BillingRepositoryError::invoice_missing(id))
    }

    fn record_payment(&mut self, draft: PaymentDraft) -> Payment {
        let payment = draft.into_payment(self.next_payment_id());
        self.payments.insert(payment.id.get(), payment.clone());
        payment
    }

    /// Flip an open invoice to Paid, refusing settled or cancelled ones.
    fn settle(&mut self, id: InvoiceId) -> Result<Invoice, BillingRepositoryError> {
        let invoice = self.invoice_mut(id)?;
        if invoice.accepts_payment().is_err() {
            return Err(BillingRepositoryError::not_payable(id, invoice.status));
        }
        invoice.status = InvoiceStatus::Paid;
        Ok(invoice.clone())
    }
}

/// Billing store owned by the billing orchestrator.
#[derive(Default)]
pub struct InMemoryBillingRepository {
    ledger: Mutex<Ledger>,
}

impl InMemoryBillingRepository {
    /// Insert or replace an invoice under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`BillingRepositoryError::Connection`] when the store lock is
    /// poisoned.
    pub fn seed_invoice(&self, invoice: Invoice) -> Result<(), BillingRepositoryError> {
        let mut ledger = self.lock()?;
        ledger.last_invoice_id = ledger.last_invoice_id.max(invoice.id.get());
        ledger.invoices.insert(invoice.id.get(), invoice);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, BillingRepositoryError> {
        self.ledger
            .lock()
            .map_err(|_| BillingRepositoryError::connection(POISONED))
    }
}

#[async_trait]
impl BillingRepository for InMemoryBillingRepository {
    async fn insert_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, BillingRepositoryError> {
        let mut ledger = self.lock()?;
        if ledger
            .invoices
            .values()
            .any(|invoice| invoice.invoice_number == draft.invoice_number)
        {
            return Err(BillingRepositoryError::number_taken(
                draft.invoice_number.as_str(),
            ));
        }
        if ledger.invoices.values().any(|invoice| {
            invoice.is_open()
                && invoice.customer_id == draft.customer_id
                && invoice.room_id == draft.room_id
                && invoice.month_year == draft.month_year
        }) {
            return Err(BillingRepositoryError::open_invoice_exists(
                draft.customer_id,
                draft.room_id,
                draft.month_year,
            ));
        }
        let invoice = draft.into_invoice(ledger.next_invoice_id());
        ledger.invoices.insert(invoice.id.get(), invoice.clone());
        Ok(invoice)
    }

    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, BillingRepositoryError> {
        Ok(self.lock()?.invoices.get(&id.get()).cloned())
    }

    async fn find_invoice_by_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, BillingRepositoryError> {
        Ok(self
            .lock()?
            .invoices
            .values()
            .find(|invoice| invoice.invoice_number.as_str() == invoice_number)
            .cloned())
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), BillingRepositoryError> {
        let mut ledger = self.lock()?;
        let stored = ledger.invoice_mut(invoice.id)?;
        if stored.status == InvoiceStatus::Paid {
            return Err(BillingRepositoryError::invoice_settled(invoice.id));
        }
        *stored = invoice.clone();
        Ok(())
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<bool, BillingRepositoryError> {
        let mut ledger = self.lock()?;
        match ledger.invoices.get(&id.get()) {
            None => Ok(false),
            Some(invoice) if invoice.status == InvoiceStatus::Paid => {
                Err(BillingRepositoryError::invoice_settled(id))
            }
            Some(_) => Ok(ledger.invoices.remove(&id.get()).is_some()),
        }
    }

    async fn list_invoices(
        &self,
        filter: InvoiceFilter,
    ) -> Result<Vec<Invoice>, BillingRepositoryError> {
        Ok(self
            .lock()?
            .invoices
            .values()
            .filter(|invoice| filter.matches(invoice))
            .cloned()
            .collect())
    }

    async fn settle_invoice(
        &self,
        invoice_id: InvoiceId,
        draft: PaymentDraft,
    ) -> Result<(Invoice, Payment), BillingRepositoryError> {
        let mut ledger = self.lock()?;
        let invoice = ledger.settle(invoice_id)?;
        let payment = ledger.record_payment(PaymentDraft {
            invoice_id: Some(invoice_id),
            ..draft
        });
        Ok((invoice, payment))
    }

    async fn insert_payment(&self, draft: PaymentDraft) -> Result<Payment, BillingRepositoryError> {
        let mut ledger = self.lock()?;
        Ok(ledger.record_payment(draft))
    }

    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>, BillingRepositoryError> {
        Ok(self.lock()?.payments.get(&id.get()).cloned())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), BillingRepositoryError> {
        let mut ledger = self.lock()?;
        let stored = ledger
            .payments
            .get_mut(&payment.id.get())
            .ok_or_else(|| BillingRepositoryError::payment_missing(payment.id))?;
        *stored = payment.clone();
        Ok(())
    }

    async fn delete_payment(
        &self,
        id: PaymentId,
    ) -> Result<Option<RemovedPayment>, BillingRepositoryError> {
        let mut ledger = self.lock()?;
        let Some(payment) = ledger.payments.remove(&id.get()) else {
            return Ok(None);
        };
        let reopened = payment.invoice_id.and_then(|invoice_id| {
            let invoice = ledger.invoices.get_mut(&invoice_id.get())?;
            if invoice.status != InvoiceStatus::Paid {
                return None;
            }
            invoice.status = InvoiceStatus::Pending;
            Some(invoice.clone())
        });
        Ok(Some(RemovedPayment { payment, reopened }))
    }

    async fn list_payments(
        &self,
        filter: PaymentFilter,
    ) -> Result<Vec<Payment>, BillingRepositoryError> {
        Ok(self
            .lock()?
            .payments
            .values()
            .filter(|payment| filter.matches(payment))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{
        Amount, CustomerId, InvoiceNumber, MonthYear, PaymentMethod, RoomId,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn invoice_draft(suffix: &str) -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: InvoiceNumber::compose(issued().date_naive(), suffix),
            customer_id: CustomerId::new(1),
            room_id: RoomId::new(10),
            month_year: MonthYear::new(6, 2025).expect("valid period"),
            amount: Amount::new(450_000),
            issue_date: issued(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid date"),
            description: None,
        }
    }

    fn payment_draft() -> PaymentDraft {
        PaymentDraft {
            invoice_id: None,
            customer_id: CustomerId::new(1),
            room_id: RoomId::new(10),
            amount: Amount::new(450_000),
            payment_date: issued(),
            method: PaymentMethod::Cash,
            transaction_id: None,
            month_year: MonthYear::new(6, 2025).expect("valid period"),
            notes: None,
        }
    }

    #[fixture]
    fn repo() -> InMemoryBillingRepository {
        InMemoryBillingRepository::default()
    }

    #[rstest]
    #[tokio::test]
    async fn second_open_invoice_for_the_same_period_is_refused(repo: InMemoryBillingRepository) {
        repo.insert_invoice(invoice_draft("AAAA"))
            .await
            .expect("first invoice");

        let err = repo
            .insert_invoice(invoice_draft("BBBB"))
            .await
            .expect_err("duplicate period");

        assert!(matches!(err, BillingRepositoryError::OpenInvoiceExists { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn invoice_numbers_are_unique(repo: InMemoryBillingRepository) {
        repo.insert_invoice(invoice_draft("AAAA"))
            .await
            .expect("first invoice");
        let mut clash = invoice_draft("AAAA");
        clash.room_id = RoomId::new(11);

        let err = repo.insert_invoice(clash).await.expect_err("number clash");

        assert_eq!(
            err,
            BillingRepositoryError::number_taken("INV-20250601-AAAA")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn settling_twice_records_a_single_payment(repo: InMemoryBillingRepository) {
        let invoice = repo
            .insert_invoice(invoice_draft("AAAA"))
            .await
            .expect("invoice");

        let (paid, payment) = repo
            .settle_invoice(invoice.id, payment_draft())
            .await
            .expect("settle");
        let err = repo
            .settle_invoice(invoice.id, payment_draft())
            .await
            .expect_err("already settled");

        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(payment.invoice_id, Some(invoice.id));
        assert_eq!(
            err,
            BillingRepositoryError::not_payable(invoice.id, InvoiceStatus::Paid)
        );
        assert_eq!(
            repo.list_payments(PaymentFilter::All)
                .await
                .expect("payments")
                .len(),
            1
        );
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_the_payment_reopens_the_invoice(repo: InMemoryBillingRepository) {
        let invoice = repo
            .insert_invoice(invoice_draft("AAAA"))
            .await
            .expect("invoice");
        let (_, payment) = repo
            .settle_invoice(invoice.id, payment_draft())
            .await
            .expect("settle");

        let removed = repo
            .delete_payment(payment.id)
            .await
            .expect("delete")
            .expect("payment existed");

        assert_eq!(
            removed.reopened.map(|reopened| reopened.status),
            Some(InvoiceStatus::Pending)
        );
        assert_eq!(repo.delete_payment(payment.id).await.expect("delete"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn paid_invoices_are_immutable(repo: InMemoryBillingRepository) {
        let invoice = repo
            .insert_invoice(invoice_draft("AAAA"))
            .await
            .expect("invoice");
        let (paid, _) = repo
            .settle_invoice(invoice.id, payment_draft())
            .await
            .expect("settle");

        assert_eq!(
            repo.update_invoice(&paid).await,
            Err(BillingRepositoryError::invoice_settled(invoice.id))
        );
        assert_eq!(
            repo.delete_invoice(invoice.id).await,
            Err(BillingRepositoryError::invoice_settled(invoice.id))
        );
    }
}
