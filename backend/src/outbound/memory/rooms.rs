//! In-memory room repository with an atomic status swap.

use async_trait::async_trait;

use super::Table;
use crate::domain::ports::{RoomRepository, RoomRepositoryError, StatusSwap};
use crate::domain::{Room, RoomDraft, RoomId, RoomStatus};

/// Room store used by the in-process room directory.
#[derive(Default)]
pub struct InMemoryRoomRepository {
    table: Table<Room>,
}

impl InMemoryRoomRepository {
    /// Insert or replace a room under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`RoomRepositoryError::Connection`] when the store lock is
    /// poisoned.
    pub fn seed(&self, room: Room) -> Result<(), RoomRepositoryError> {
        let mut state = self.table.lock(RoomRepositoryError::connection)?;
        state.seed(room.id.get(), room);
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert(&self, draft: RoomDraft) -> Result<Room, RoomRepositoryError> {
        let mut state = self.table.lock(RoomRepositoryError::connection)?;
        if state
            .rows
            .values()
            .any(|room| room.room_number == draft.room_number)
        {
            return Err(RoomRepositoryError::duplicate_number(draft.room_number));
        }
        let id = state.allocate();
        let room = Room {
            id: RoomId::new(id),
            room_number: draft.room_number,
            monthly_price: draft.monthly_price,
            status: RoomStatus::Available,
            description: draft.description,
        };
        state.rows.insert(id, room.clone());
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError> {
        let state = self.table.lock(RoomRepositoryError::connection)?;
        Ok(state.rows.get(&id.get()).cloned())
    }

    async fn find_by_number(&self, room_number: &str) -> Result<Option<Room>, RoomRepositoryError> {
        let state = self.table.lock(RoomRepositoryError::connection)?;
        Ok(state
            .rows
            .values()
            .find(|room| room.room_number == room_number)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Room>, RoomRepositoryError> {
        let state = self.table.lock(RoomRepositoryError::connection)?;
        Ok(state.rows.values().cloned().collect())
    }

    async fn swap_status(
        &self,
        id: RoomId,
        from: RoomStatus,
        to: RoomStatus,
    ) -> Result<StatusSwap, RoomRepositoryError> {
        let mut state = self.table.lock(RoomRepositoryError::connection)?;
        let Some(room) = state.rows.get_mut(&id.get()) else {
            return Ok(StatusSwap::Missing);
        };
        if room.status != from {
            return Ok(StatusSwap::Stale(room.clone()));
        }
        room.status = to;
        Ok(StatusSwap::Swapped(room.clone()))
    }
}
