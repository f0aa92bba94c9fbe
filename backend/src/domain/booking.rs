//! Booking records and their lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, CustomerId, RoomId};

/// Note stored on the booking created implicitly by a walk-in check-in.
pub const WALK_IN_NOTE: &str = "walk-in check-in";

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Reserved; the room is held as Booked.
    Pending,
    /// Converted into a check-in; the room is held as Occupied.
    CheckedIn,
    /// Abandoned; the room has been released.
    Cancelled,
    /// The stay it led to has ended.
    Completed,
}

impl BookingStatus {
    /// True while the booking holds its room.
    #[must_use]
    pub const fn holds_room(self) -> bool {
        matches!(self, Self::Pending | Self::CheckedIn)
    }

    /// True once no further lifecycle change is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

/// A reservation of a room by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Store-assigned identifier.
    pub id: BookingId,
    /// Customer holding the reservation.
    pub customer_id: CustomerId,
    /// Reserved room.
    pub room_id: RoomId,
    /// When the booking was taken.
    pub booking_date: DateTime<Utc>,
    /// Planned arrival date.
    pub check_in_date: NaiveDate,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Booking fields before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    /// Customer holding the reservation.
    pub customer_id: CustomerId,
    /// Reserved room.
    pub room_id: RoomId,
    /// When the booking was taken.
    pub booking_date: DateTime<Utc>,
    /// Planned arrival date.
    pub check_in_date: NaiveDate,
    /// Initial status.
    pub status: BookingStatus,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

impl BookingDraft {
    /// Attach the store-assigned identifier.
    #[must_use]
    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            customer_id: self.customer_id,
            room_id: self.room_id,
            booking_date: self.booking_date,
            check_in_date: self.check_in_date,
            status: self.status,
            notes: self.notes,
        }
    }
}
