//! Port and runtime dependency bundles for the reconciler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::domain::RoomLanes;
use crate::domain::ports::{RoomDirectory, RoomIntentStore};

use super::{BackoffJitter, Sleeper};

/// Port bundle required by the reconciler.
pub struct ReconcilerPorts {
    /// Room directory receiving re-issued status changes.
    pub directory: Arc<dyn RoomDirectory>,
    /// Store holding recorded intents.
    pub intents: Arc<dyn RoomIntentStore>,
    /// Per-room ordering shared with the request-path [`crate::domain::RoomSync`].
    pub lanes: RoomLanes,
}

impl ReconcilerPorts {
    /// Build a strongly-typed reconciler port bundle.
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        intents: Arc<dyn RoomIntentStore>,
        lanes: RoomLanes,
    ) -> Self {
        Self {
            directory,
            intents,
            lanes,
        }
    }
}

/// Runtime helpers used by the sweep loop and retry scheduling.
pub struct ReconcilerRuntime {
    /// Async sleep implementation between sweeps.
    pub sleeper: Arc<dyn Sleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for ReconcilerRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let extra = rand::thread_rng().gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
