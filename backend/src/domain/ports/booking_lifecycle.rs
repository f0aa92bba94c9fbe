//! Driving port for booking operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Booking, BookingId, BookingStatus, CustomerId, DisplayFields, Error, RoomId};

use super::BookingFilter;

/// Request to reserve a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Customer making the reservation.
    pub customer_id: CustomerId,
    /// Room to reserve.
    pub room_id: RoomId,
    /// Planned arrival date.
    pub check_in_date: NaiveDate,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to amend a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    /// Room to hold; a different room triggers a release and an acquire.
    pub room_id: RoomId,
    /// Planned arrival date.
    pub check_in_date: NaiveDate,
    /// Replacement notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A booking decorated with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    /// The booking record.
    #[serde(flatten)]
    pub booking: Booking,
    /// Best-effort display fields.
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// Booking operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingLifecycle: Send + Sync {
    /// Reserve a room for a customer.
    async fn create_booking(&self, request: CreateBookingRequest) -> Result<BookingView, Error>;

    /// Amend dates, notes or room.
    async fn update_booking(
        &self,
        id: BookingId,
        request: UpdateBookingRequest,
    ) -> Result<BookingView, Error>;

    /// Move a booking to another status.
    async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<BookingView, Error>;

    /// Release the room and delete the booking.
    async fn delete_booking(&self, id: BookingId) -> Result<(), Error>;

    /// Fetch one booking.
    async fn get_booking(&self, id: BookingId) -> Result<BookingView, Error>;

    /// Bookings selected by `filter`, in creation order.
    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<BookingView>, Error>;
}
