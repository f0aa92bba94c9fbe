//! Port for check-in persistence.

use async_trait::async_trait;

use crate::domain::{BookingId, CheckIn, CheckInDraft, CheckInId, CheckInStatus, CustomerId, RoomId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by check-in repository adapters.
    pub enum CheckInRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "check-in repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "check-in repository query failed: {message}",
        /// The check-in to update does not exist.
        Missing { check_in_id: CheckInId } =>
            "check-in {check_in_id} does not exist",
    }
}

/// Selection applied when listing check-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckInFilter {
    /// Every check-in.
    #[default]
    All,
    /// Check-ins of one customer.
    Customer(CustomerId),
    /// Check-ins of one room.
    Room(RoomId),
    /// Check-ins in one status.
    Status(CheckInStatus),
    /// Check-ins fulfilling one booking.
    Booking(BookingId),
}

impl CheckInFilter {
    /// True when `check_in` is selected by this filter.
    #[must_use]
    pub fn matches(&self, check_in: &CheckIn) -> bool {
        match *self {
            Self::All => true,
            Self::Customer(customer_id) => check_in.customer_id == customer_id,
            Self::Room(room_id) => check_in.room_id == room_id,
            Self::Status(status) => check_in.status == status,
            Self::Booking(booking_id) => check_in.booking_id == Some(booking_id),
        }
    }
}

/// Port for storing check-ins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckInRepository: Send + Sync {
    /// Persist a new Active check-in.
    async fn insert(&self, draft: CheckInDraft) -> Result<CheckIn, CheckInRepositoryError>;

    /// Find a check-in by id.
    async fn find_by_id(&self, id: CheckInId) -> Result<Option<CheckIn>, CheckInRepositoryError>;

    /// Overwrite an existing check-in.
    async fn update(&self, check_in: &CheckIn) -> Result<(), CheckInRepositoryError>;

    /// Remove a check-in; `false` when it did not exist.
    async fn delete(&self, id: CheckInId) -> Result<bool, CheckInRepositoryError>;

    /// Check-ins selected by `filter`, in creation order.
    async fn list(&self, filter: CheckInFilter) -> Result<Vec<CheckIn>, CheckInRepositoryError>;
}
