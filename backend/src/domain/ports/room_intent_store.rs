//! Port for durable room-status intents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{IntentId, RoomStatusIntent, RoomStatusIntentDraft};

use super::define_port_error;

define_port_error! {
    /// Errors raised by intent store adapters.
    pub enum RoomIntentStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "room intent store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "room intent store query failed: {message}",
        /// The intent does not exist.
        Missing { intent_id: IntentId } =>
            "room intent {intent_id} does not exist",
    }
}

/// Port for recording, rescheduling and resolving room-status intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomIntentStore: Send + Sync {
    /// Persist a new Pending intent recorded at `now`.
    async fn record(
        &self,
        draft: RoomStatusIntentDraft,
        now: DateTime<Utc>,
    ) -> Result<RoomStatusIntent, RoomIntentStoreError>;

    /// Find an intent by id.
    async fn find(&self, id: IntentId) -> Result<Option<RoomStatusIntent>, RoomIntentStoreError>;

    /// Overwrite an existing intent.
    async fn update(&self, intent: &RoomStatusIntent) -> Result<(), RoomIntentStoreError>;

    /// Retire every Pending intent for `intent`'s room recorded before it.
    ///
    /// The newest request for a room describes the status its owners want,
    /// so older undelivered requests must never be re-issued after it.
    /// Flagged intents are left for an operator. Returns the retired ids.
    async fn supersede(
        &self,
        intent: &RoomStatusIntent,
    ) -> Result<Vec<IntentId>, RoomIntentStoreError>;

    /// Remove an intent once it is resolved; `false` when it did not exist.
    async fn resolve(&self, id: IntentId) -> Result<bool, RoomIntentStoreError>;

    /// Pending intents whose next attempt is at or before `now`, oldest first.
    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RoomStatusIntent>, RoomIntentStoreError>;

    /// Every stored intent, oldest first.
    async fn list(&self) -> Result<Vec<RoomStatusIntent>, RoomIntentStoreError>;
}
