//! Driving port for check-in operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BookingId, CheckIn, CheckInId, CheckInStatus, CustomerId, DisplayFields, Error, RoomId};

use super::CheckInFilter;

/// Request for a walk-in check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckInRequest {
    /// Arriving customer.
    pub customer_id: CustomerId,
    /// Room to occupy.
    pub room_id: RoomId,
    /// Arrival date; today when absent.
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
}

/// Request to amend a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckInRequest {
    /// Room to occupy; a different room triggers a release and an acquire.
    pub room_id: RoomId,
    /// Replacement departure date; unchanged when absent.
    #[serde(default)]
    pub expected_check_out_date: Option<NaiveDate>,
}

/// A check-in decorated with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInView {
    /// The check-in record.
    #[serde(flatten)]
    pub check_in: CheckIn,
    /// Best-effort display fields.
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// Check-in operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckInLifecycle: Send + Sync {
    /// Check a walk-in customer straight into a room.
    async fn create_check_in(&self, request: CreateCheckInRequest) -> Result<CheckInView, Error>;

    /// Convert a pending booking into a check-in.
    async fn create_check_in_from_booking(&self, booking_id: BookingId) -> Result<CheckInView, Error>;

    /// Amend the room or expected departure.
    async fn update_check_in(
        &self,
        id: CheckInId,
        request: UpdateCheckInRequest,
    ) -> Result<CheckInView, Error>;

    /// Move a check-in to another status.
    async fn update_check_in_status(
        &self,
        id: CheckInId,
        status: CheckInStatus,
    ) -> Result<CheckInView, Error>;

    /// Release the room and delete the check-in.
    async fn delete_check_in(&self, id: CheckInId) -> Result<(), Error>;

    /// Fetch one check-in.
    async fn get_check_in(&self, id: CheckInId) -> Result<CheckInView, Error>;

    /// Check-ins selected by `filter`, in creation order.
    async fn list_check_ins(&self, filter: CheckInFilter) -> Result<Vec<CheckInView>, Error>;
}
