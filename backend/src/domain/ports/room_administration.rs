//! Driving port for the room directory's own HTTP surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Room, RoomDraft, RoomId, RoomStatus, RoomStatusChange};

/// Selection applied when listing rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomFilter {
    /// Every room.
    #[default]
    All,
    /// Rooms in one status.
    Status(RoomStatus),
}

/// Body of a compare-and-set status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoomStatusRequest {
    /// Status the caller believes is current.
    #[serde(default)]
    pub expected: Option<RoomStatus>,
    /// Requested status.
    pub status: RoomStatus,
}

impl SetRoomStatusRequest {
    /// Address the request to `room_id`.
    #[must_use]
    pub const fn for_room(self, room_id: RoomId) -> RoomStatusChange {
        RoomStatusChange {
            room_id,
            expected: self.expected,
            target: self.status,
        }
    }
}

/// Administrative and read operations on rooms.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomAdministration: Send + Sync {
    /// Register a new room; it starts Available.
    async fn register_room(&self, draft: RoomDraft) -> Result<Room, Error>;

    /// Fetch a room by id.
    async fn get_room(&self, id: RoomId) -> Result<Room, Error>;

    /// Fetch a room by its room number.
    async fn get_room_by_number(&self, room_number: &str) -> Result<Room, Error>;

    /// Rooms selected by `filter`, in creation order.
    async fn list_rooms(&self, filter: RoomFilter) -> Result<Vec<Room>, Error>;

    /// Compare-and-set a room's status.
    async fn change_status(&self, change: RoomStatusChange) -> Result<Room, Error>;

    /// Withdraw an Available room for maintenance.
    async fn start_maintenance(&self, id: RoomId) -> Result<Room, Error>;

    /// Return a room under maintenance to service.
    async fn finish_maintenance(&self, id: RoomId) -> Result<Room, Error>;
}
