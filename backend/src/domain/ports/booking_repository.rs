//! Port for booking persistence.

use async_trait::async_trait;

use crate::domain::{Booking, BookingDraft, BookingId, BookingStatus, CustomerId, RoomId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "booking repository query failed: {message}",
        /// The booking to update does not exist.
        Missing { booking_id: BookingId } =>
            "booking {booking_id} does not exist",
        /// Another live booking already holds the room.
        RoomHeld { room_id: RoomId, booking_id: BookingId } =>
            "room {room_id} is already held by booking {booking_id}",
    }
}

/// Selection applied when listing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingFilter {
    /// Every booking.
    #[default]
    All,
    /// Bookings held by one customer.
    Customer(CustomerId),
    /// Bookings for one room.
    Room(RoomId),
    /// Bookings in one status.
    Status(BookingStatus),
    /// Bookings matching a customer id or carrying a booking id.
    Search {
        /// Customer to match.
        customer_id: Option<CustomerId>,
        /// Booking to match.
        booking_id: Option<BookingId>,
    },
}

impl BookingFilter {
    /// True when `booking` is selected by this filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        match *self {
            Self::All => true,
            Self::Customer(customer_id) => booking.customer_id == customer_id,
            Self::Room(room_id) => booking.room_id == room_id,
            Self::Status(status) => booking.status == status,
            Self::Search {
                customer_id,
                booking_id,
            } => {
                customer_id.is_some_and(|id| booking.customer_id == id)
                    || booking_id.is_some_and(|id| booking.id == id)
            }
        }
    }
}

/// Port for storing bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking and return it with its assigned id.
    ///
    /// Refuses with [`BookingRepositoryError::RoomHeld`] when the draft holds
    /// its room and another stored booking already holds the same room.
    async fn insert(&self, draft: BookingDraft) -> Result<Booking, BookingRepositoryError>;

    /// Find a booking by id.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Overwrite an existing booking, under the same room-holding rule as
    /// [`BookingRepository::insert`].
    async fn update(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    /// Remove a booking; `false` when it did not exist.
    async fn delete(&self, id: BookingId) -> Result<bool, BookingRepositoryError>;

    /// Bookings selected by `filter`, in creation order.
    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, BookingRepositoryError>;
}
