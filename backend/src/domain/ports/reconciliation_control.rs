//! Driving port for operators inspecting room-status reconciliation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, IntentId, RoomStatusIntent};

/// Counts from one reconciliation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Due intents examined.
    pub examined: usize,
    /// Intents confirmed by the room directory and resolved.
    pub applied: usize,
    /// Intents rescheduled after another unavailable attempt.
    pub deferred: usize,
    /// Intents flagged for manual attention.
    pub flagged: usize,
}

/// Operator access to recorded intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReconciliationControl: Send + Sync {
    /// Every recorded intent, oldest first.
    async fn list_intents(&self) -> Result<Vec<RoomStatusIntent>, Error>;

    /// Run one sweep immediately.
    async fn sweep_now(&self) -> Result<SweepReport, Error>;

    /// Drop an intent after manual resolution.
    async fn resolve_intent(&self, id: IntentId) -> Result<(), Error>;
}
