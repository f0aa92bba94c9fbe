//! Check-in records and the stay policy that dates them.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{BookingId, CheckInId, CustomerId, RoomId};

/// Lifecycle status of a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInStatus {
    /// The guest is in the room.
    Active,
    /// The guest has left; terminal.
    CheckedOut,
}

/// A guest's occupation of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Store-assigned identifier.
    pub id: CheckInId,
    /// Booking this check-in fulfils; walk-ins get a synthetic one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    /// Occupying customer.
    pub customer_id: CustomerId,
    /// Occupied room.
    pub room_id: RoomId,
    /// Arrival date.
    pub check_in_date: NaiveDate,
    /// Planned departure date.
    pub expected_check_out_date: NaiveDate,
    /// Lifecycle status.
    pub status: CheckInStatus,
}

/// Check-in fields before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInDraft {
    /// Booking this check-in fulfils.
    pub booking_id: Option<BookingId>,
    /// Occupying customer.
    pub customer_id: CustomerId,
    /// Occupied room.
    pub room_id: RoomId,
    /// Arrival date.
    pub check_in_date: NaiveDate,
    /// Planned departure date.
    pub expected_check_out_date: NaiveDate,
}

impl CheckInDraft {
    /// Attach the store-assigned identifier; new check-ins start Active.
    #[must_use]
    pub const fn into_check_in(self, id: CheckInId) -> CheckIn {
        CheckIn {
            id,
            booking_id: self.booking_id,
            customer_id: self.customer_id,
            room_id: self.room_id,
            check_in_date: self.check_in_date,
            expected_check_out_date: self.expected_check_out_date,
            status: CheckInStatus::Active,
        }
    }
}

/// Length of a default stay, used to date the expected check-out.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use rentals::domain::StayPolicy;
///
/// let arrival = NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid date");
/// let departure = StayPolicy::default().expected_check_out(arrival);
/// assert_eq!(departure, NaiveDate::from_ymd_opt(2025, 2, 28));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayPolicy {
    months: u32,
}

impl StayPolicy {
    /// Stays of `months` calendar months.
    #[must_use]
    pub const fn months(months: u32) -> Self {
        Self { months }
    }

    /// Expected departure for an arrival on `check_in_date`.
    ///
    /// Month arithmetic clamps to the last day of shorter months. Returns
    /// `None` when the result leaves chrono's supported range.
    #[must_use]
    pub fn expected_check_out(self, check_in_date: NaiveDate) -> Option<NaiveDate> {
        check_in_date.checked_add_months(Months::new(self.months))
    }
}

impl Default for StayPolicy {
    fn default() -> Self {
        Self::months(1)
    }
}
