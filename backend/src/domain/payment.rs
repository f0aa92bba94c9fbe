//! Payment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, CustomerId, InvoiceId, MonthYear, PaymentId, RoomId};

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash at the desk.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Card payment.
    CreditCard,
    /// Mobile banking app.
    MobileBanking,
    /// Anything else.
    Other,
}

/// A received payment. Payments are append-only; deleting one reverts the
/// invoice it settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Store-assigned identifier.
    pub id: PaymentId,
    /// Invoice this payment settled, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<InvoiceId>,
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Room paid for.
    pub room_id: RoomId,
    /// Amount received in minor currency units.
    pub amount: Amount,
    /// When the payment was recorded.
    pub payment_date: DateTime<Utc>,
    /// Payment channel.
    pub method: PaymentMethod,
    /// External reference from the payment channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Billing period covered.
    pub month_year: MonthYear,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment fields before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    /// Invoice to settle, if any.
    pub invoice_id: Option<InvoiceId>,
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Room paid for.
    pub room_id: RoomId,
    /// Amount received.
    pub amount: Amount,
    /// When the payment was recorded.
    pub payment_date: DateTime<Utc>,
    /// Payment channel.
    pub method: PaymentMethod,
    /// External reference.
    pub transaction_id: Option<String>,
    /// Billing period covered.
    pub month_year: MonthYear,
    /// Optional notes.
    pub notes: Option<String>,
}

impl PaymentDraft {
    /// Attach the store-assigned identifier.
    #[must_use]
    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            invoice_id: self.invoice_id,
            customer_id: self.customer_id,
            room_id: self.room_id,
            amount: self.amount,
            payment_date: self.payment_date,
            method: self.method,
            transaction_id: self.transaction_id,
            month_year: self.month_year,
            notes: self.notes,
        }
    }
}
