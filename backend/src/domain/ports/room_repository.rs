//! Port for room persistence owned by the room directory.

use async_trait::async_trait;

use crate::domain::{Room, RoomDraft, RoomId, RoomStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by room repository adapters.
    pub enum RoomRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "room repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "room repository query failed: {message}",
        /// Another room already uses this number.
        DuplicateNumber { room_number: String } =>
            "room number {room_number} is already registered",
    }
}

/// Result of an atomic status swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSwap {
    /// The stored status matched `from` and now holds `to`.
    Swapped(Room),
    /// The stored status no longer matched `from`; the fresh record is returned.
    Stale(Room),
    /// The room does not exist.
    Missing,
}

/// Port for reading rooms and swapping their status atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Persist a new room in [`RoomStatus::Available`].
    async fn insert(&self, draft: RoomDraft) -> Result<Room, RoomRepositoryError>;

    /// Find a room by id.
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError>;

    /// Find a room by its room number.
    async fn find_by_number(&self, room_number: &str) -> Result<Option<Room>, RoomRepositoryError>;

    /// All rooms in creation order.
    async fn list(&self) -> Result<Vec<Room>, RoomRepositoryError>;

    /// Replace the status with `to` only if it currently equals `from`.
    async fn swap_status(
        &self,
        id: RoomId,
        from: RoomStatus,
        to: RoomStatus,
    ) -> Result<StatusSwap, RoomRepositoryError>;
}
