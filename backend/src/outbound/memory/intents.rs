//! In-memory room-status intent store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Table;
use crate::domain::ports::{RoomIntentStore, RoomIntentStoreError};
use crate::domain::{IntentId, IntentState, RoomStatusIntent, RoomStatusIntentDraft};

/// Intent store shared by room sync and the reconciler.
#[derive(Default)]
pub struct InMemoryRoomIntentStore {
    table: Table<RoomStatusIntent>,
}

#[async_trait]
impl RoomIntentStore for InMemoryRoomIntentStore {
    async fn record(
        &self,
        draft: RoomStatusIntentDraft,
        now: DateTime<Utc>,
    ) -> Result<RoomStatusIntent, RoomIntentStoreError> {
        let mut state = self.table.lock(RoomIntentStoreError::connection)?;
        let id = state.allocate();
        let intent = draft.into_intent(IntentId::new(id), now);
        state.rows.insert(id, intent.clone());
        Ok(intent)
    }

    async fn find(&self, id: IntentId) -> Result<Option<RoomStatusIntent>, RoomIntentStoreError> {
        let state = self.table.lock(RoomIntentStoreError::connection)?;
        Ok(state.rows.get(&id.get()).cloned())
    }

    async fn update(&self, intent: &RoomStatusIntent) -> Result<(), RoomIntentStoreError> {
        let mut state = self.table.lock(RoomIntentStoreError::connection)?;
        let slot = state
            .rows
            .get_mut(&intent.id.get())
            .ok_or_else(|| RoomIntentStoreError::missing(intent.id))?;
        *slot = intent.clone();
        Ok(())
    }

    async fn supersede(
        &self,
        intent: &RoomStatusIntent,
    ) -> Result<Vec<IntentId>, RoomIntentStoreError> {
        let mut state = self.table.lock(RoomIntentStoreError::connection)?;
        let retired: Vec<IntentId> = state
            .rows
            .range(..intent.id.get())
            .filter(|(_, older)| {
                older.room_id == intent.room_id && older.state == IntentState::Pending
            })
            .map(|(_, older)| older.id)
            .collect();
        for id in &retired {
            state.rows.remove(&id.get());
        }
        Ok(retired)
    }

    async fn resolve(&self, id: IntentId) -> Result<bool, RoomIntentStoreError> {
        let mut state = self.table.lock(RoomIntentStoreError::connection)?;
        Ok(state.rows.remove(&id.get()).is_some())
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RoomStatusIntent>, RoomIntentStoreError> {
        let state = self.table.lock(RoomIntentStoreError::connection)?;
        Ok(state
            .rows
            .values()
            .filter(|intent| intent.is_due(now))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<RoomStatusIntent>, RoomIntentStoreError> {
        let state = self.table.lock(RoomIntentStoreError::connection)?;
        Ok(state.rows.values().cloned().collect())
    }
}
