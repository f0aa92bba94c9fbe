//! Invoices, billing periods and invoice numbering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Amount, CustomerId, InvoiceId, RoomId};

/// Lifecycle status of an invoice.
///
/// `Overdue` is never stored; it is derived at read time from a Pending
/// invoice whose due date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Awaiting payment.
    Pending,
    /// Settled by exactly one payment.
    Paid,
    /// Pending past its due date.
    Overdue,
    /// Withdrawn.
    Cancelled,
}

impl InvoiceStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing period in `MM/YYYY` form.
///
/// # Examples
/// ```
/// use rentals::domain::MonthYear;
///
/// let period: MonthYear = "06/2025".parse().expect("valid period");
/// assert_eq!(period.to_string(), "06/2025");
/// assert_eq!("6-2025".parse::<MonthYear>(), Ok(period));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthYear {
    year: i32,
    month: u32,
}

/// Error returned for a malformed billing period.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("billing period must look like MM/YYYY, got {0:?}")]
pub struct MonthYearParseError(pub String);

impl MonthYear {
    /// Build a period, rejecting months outside 1..=12.
    pub fn new(month: u32, year: i32) -> Result<Self, MonthYearParseError> {
        if (1..=12).contains(&month) && (1..=9999).contains(&year) {
            Ok(Self { year, month })
        } else {
            Err(MonthYearParseError(format!("{month}/{year}")))
        }
    }

    /// Period containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar month, 1-based.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || MonthYearParseError(raw.to_owned());
        let (month, year) = raw.split_once(['/', '-']).ok_or_else(invalid)?;
        if month.is_empty() || month.len() > 2 || year.len() != 4 {
            return Err(invalid());
        }
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        Self::new(month, year).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthYear {
    type Error = MonthYearParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthYear> for String {
    fn from(value: MonthYear) -> Self {
        value.to_string()
    }
}

/// Human-facing invoice number, `INV-YYYYMMDD-XXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

impl InvoiceNumber {
    /// Compose a number from an issue date and a suffix.
    #[must_use]
    pub fn compose(issue_date: NaiveDate, suffix: &str) -> Self {
        Self(format!("INV-{}-{suffix}", issue_date.format("%Y%m%d")))
    }

    /// Borrow the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for InvoiceNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Source of fresh invoice numbers.
///
/// Uniqueness is enforced by the billing store; a source only needs to make
/// collisions unlikely.
pub trait InvoiceNumberSource: Send + Sync {
    /// Produce a candidate number for an invoice issued on `issue_date`.
    fn next_number(&self, issue_date: NaiveDate) -> InvoiceNumber;
}

/// Draws four uppercase alphanumerics from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomInvoiceNumbers;

impl InvoiceNumberSource for RandomInvoiceNumbers {
    fn next_number(&self, issue_date: NaiveDate) -> InvoiceNumber {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| SUFFIX_ALPHABET.get(rng.gen_range(0..SUFFIX_ALPHABET.len())))
            .map(|byte| char::from(*byte))
            .collect();
        InvoiceNumber::compose(issue_date, &suffix)
    }
}

/// A monthly charge raised against a customer for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Store-assigned identifier.
    pub id: InvoiceId,
    /// Unique human-facing number.
    pub invoice_number: InvoiceNumber,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Billed room.
    pub room_id: RoomId,
    /// Billing period.
    pub month_year: MonthYear,
    /// Amount due in minor currency units.
    pub amount: Amount,
    /// When the invoice was raised.
    pub issue_date: DateTime<Utc>,
    /// Last day for payment.
    pub due_date: NaiveDate,
    /// Stored status; see [`Invoice::effective_status`].
    pub status: InvoiceStatus,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Why an invoice cannot take a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRefusal {
    /// A payment already settled it.
    AlreadyPaid,
    /// It was cancelled.
    Cancelled,
}

impl Invoice {
    /// Status as observed on `today`: Pending past the due date reads Overdue.
    #[must_use]
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Pending if self.due_date < today => InvoiceStatus::Overdue,
            other => other,
        }
    }

    /// True while the invoice awaits payment (Pending or Overdue).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }

    /// Check that a payment may settle this invoice.
    pub const fn accepts_payment(&self) -> Result<(), PaymentRefusal> {
        match self.status {
            InvoiceStatus::Paid => Err(PaymentRefusal::AlreadyPaid),
            InvoiceStatus::Cancelled => Err(PaymentRefusal::Cancelled),
            InvoiceStatus::Pending | InvoiceStatus::Overdue => Ok(()),
        }
    }

    /// Copy of the invoice with its status replaced by the effective one.
    #[must_use]
    pub fn as_of(&self, today: NaiveDate) -> Self {
        let mut observed = self.clone();
        observed.status = self.effective_status(today);
        observed
    }
}

/// Invoice fields before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Unique human-facing number.
    pub invoice_number: InvoiceNumber,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Billed room.
    pub room_id: RoomId,
    /// Billing period.
    pub month_year: MonthYear,
    /// Amount due.
    pub amount: Amount,
    /// When the invoice was raised.
    pub issue_date: DateTime<Utc>,
    /// Last day for payment.
    pub due_date: NaiveDate,
    /// Optional free-text description.
    pub description: Option<String>,
}

impl InvoiceDraft {
    /// Attach the store-assigned identifier; new invoices start Pending.
    #[must_use]
    pub fn into_invoice(self, id: InvoiceId) -> Invoice {
        Invoice {
            id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            room_id: self.room_id,
            month_year: self.month_year,
            amount: self.amount,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status: InvoiceStatus::Pending,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[fixture]
    fn invoice() -> Invoice {
        InvoiceDraft {
            invoice_number: InvoiceNumber::compose(date(2025, 6, 1), "AB12"),
            customer_id: CustomerId::new(1),
            room_id: RoomId::new(10),
            month_year: MonthYear::new(6, 2025).expect("valid period"),
            amount: Amount::new(450_000),
            issue_date: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("valid instant"),
            due_date: date(2025, 6, 10),
            description: None,
        }
        .into_invoice(InvoiceId::new(42))
    }

    #[rstest]
    #[case("06/2025", 6, 2025)]
    #[case("6/2025", 6, 2025)]
    #[case("12-1999", 12, 1999)]
    fn month_year_parses_accepted_forms(#[case] raw: &str, #[case] month: u32, #[case] year: i32) {
        let parsed: MonthYear = raw.parse().expect("valid period");
        assert_eq!((parsed.month(), parsed.year()), (month, year));
    }

    #[rstest]
    #[case("13/2025")]
    #[case("00/2025")]
    #[case("06/25")]
    #[case("June 2025")]
    #[case("")]
    fn month_year_rejects_malformed_input(#[case] raw: &str) {
        assert!(raw.parse::<MonthYear>().is_err());
    }

    #[rstest]
    fn month_year_serialises_as_padded_string() {
        let period = MonthYear::of(date(2025, 3, 9));
        let json = serde_json::to_string(&period).expect("serialise period");
        assert_eq!(json, "\"03/2025\"");
    }

    #[rstest]
    fn random_numbers_follow_the_documented_shape() {
        let number = RandomInvoiceNumbers.next_number(date(2025, 6, 1));
        let text = number.as_str();
        assert!(text.starts_with("INV-20250601-"));
        let suffix = text.trim_start_matches("INV-20250601-");
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[rstest]
    fn pending_invoice_reads_overdue_after_due_date(invoice: Invoice) {
        assert_eq!(invoice.effective_status(date(2025, 6, 10)), InvoiceStatus::Pending);
        assert_eq!(invoice.effective_status(date(2025, 6, 11)), InvoiceStatus::Overdue);
        assert_eq!(invoice.as_of(date(2025, 7, 1)).status, InvoiceStatus::Overdue);
    }

    #[rstest]
    fn settled_invoices_never_read_overdue(mut invoice: Invoice) {
        invoice.status = InvoiceStatus::Paid;
        assert_eq!(invoice.effective_status(date(2026, 1, 1)), InvoiceStatus::Paid);
    }

    #[rstest]
    #[case(InvoiceStatus::Pending, Ok(()))]
    #[case(InvoiceStatus::Paid, Err(PaymentRefusal::AlreadyPaid))]
    #[case(InvoiceStatus::Cancelled, Err(PaymentRefusal::Cancelled))]
    fn payment_acceptance_follows_status(
        mut invoice: Invoice,
        #[case] status: InvoiceStatus,
        #[case] expected: Result<(), PaymentRefusal>,
    ) {
        invoice.status = status;
        assert_eq!(invoice.accepts_payment(), expected);
    }
}
