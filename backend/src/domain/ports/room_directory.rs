//! Port through which orchestrators read rooms and change their status.

use async_trait::async_trait;

use crate::domain::{Room, RoomId, RoomStatus, RoomStatusChange};

use super::{DirectoryError, define_port_error};

define_port_error! {
    /// Outcomes of a refused or undelivered status change.
    pub enum RoomStatusError {
        /// No room with this id exists.
        NotFound { room_id: RoomId } =>
            "room {room_id} not found",
        /// The caller's expected status did not match.
        Conflict { room_id: RoomId, current: RoomStatus } =>
            "room {room_id} is currently {current}",
        /// The requested move is not an edge of the room state machine.
        InvalidTransition { room_id: RoomId, from: RoomStatus, to: RoomStatus } =>
            "room {room_id} cannot move from {from} to {to}",
        /// The directory could not be reached or did not answer in time.
        Unavailable { message: String } =>
            "room directory unavailable: {message}",
    }
}

impl RoomStatusError {
    /// True when re-issuing the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<DirectoryError> for RoomStatusError {
    fn from(value: DirectoryError) -> Self {
        Self::unavailable(value.to_string())
    }
}

/// Room directory as seen by the orchestrators.
///
/// The in-process [`crate::domain::RoomDirectoryService`] and the HTTP
/// client both implement it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Look up a room; `Ok(None)` when the directory has no such record.
    async fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, DirectoryError>;

    /// Compare-and-set the room's status.
    ///
    /// Re-applying the current status succeeds without a write.
    async fn set_status(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError>;
}
