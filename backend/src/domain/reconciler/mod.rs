//! Reconciliation of undelivered room-status intents.
//!
//! The reconciler sweeps pending intents whose next attempt is due and
//! re-issues their compare-and-set against the room directory. Unavailable
//! directories are retried with jittered exponential backoff; refusals and
//! exhausted intents are flagged for an operator.
//!
//! Each intent is re-read inside its room's lane before delivery, so an
//! intent superseded by a newer request while the sweep was running is
//! skipped rather than re-issued.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::ports::{
    ReconciliationControl, RoomDirectory, RoomIntentStore, RoomIntentStoreError, RoomStatusError,
    SweepReport,
};
use crate::domain::room_sync::{RoomLanes, deliver_with_timeout};
use crate::domain::{Error, IntentId, IntentState, RoomStatusIntent};

mod runtime;

pub use runtime::{RandomJitter, ReconcilerPorts, ReconcilerRuntime, TokioSleeper};

/// Reconciler configuration controlling cadence and retry behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Pause between sweeps in [`Reconciler::run`].
    pub sweep_interval: Duration,
    /// Maximum intents examined per sweep.
    pub batch_size: usize,
    /// Failed deliveries after which an intent is flagged; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Delay after the first failed delivery.
    pub initial_backoff: Duration,
    /// Cap on the exponential delay.
    pub max_backoff: Duration,
    /// Bound on each directory call.
    pub call_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5),
            batch_size: 64,
            max_attempts: None,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            call_timeout: Duration::from_secs(3),
        }
    }
}

/// Async clock-independent sleeping abstraction for the sweep loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use rentals::domain::Sleeper;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::time::Duration;
    ///
    /// #[derive(Default)]
    /// struct CountingSleeper(AtomicU32);
    ///
    /// #[async_trait]
    /// impl Sleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         self.0.fetch_add(1, Ordering::SeqCst);
    ///     }
    /// }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use rentals::domain::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    ///
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid time");
    /// assert_eq!(
    ///     FixedJitter.jittered_delay(Duration::from_millis(100), 2, now),
    ///     Duration::from_millis(110)
    /// );
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntentResolution {
    Applied,
    Deferred,
    Flagged,
    Skipped,
}

fn map_store_error(error: RoomIntentStoreError) -> Error {
    match error {
        RoomIntentStoreError::Connection { message } => {
            Error::service_unavailable(format!("room intent store unavailable: {message}"))
        }
        RoomIntentStoreError::Query { message } => {
            Error::internal(format!("room intent store error: {message}"))
        }
        RoomIntentStoreError::Missing { intent_id } => {
            Error::not_found(format!("room intent {intent_id} not found"))
        }
    }
}

/// Re-issues pending room-status intents until they converge.
pub struct Reconciler {
    directory: Arc<dyn RoomDirectory>,
    intents: Arc<dyn RoomIntentStore>,
    lanes: RoomLanes,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Build a reconciler using default runtime dependencies.
    /// ```rust,ignore
    /// let reconciler = Reconciler::new(ports, clock, ReconcilerConfig::default());
    /// ```
    pub fn new(ports: ReconcilerPorts, clock: Arc<dyn Clock>, config: ReconcilerConfig) -> Self {
        Self::with_runtime(ports, clock, ReconcilerRuntime::default(), config)
    }

    /// Build a reconciler with injected runtime abstractions.
    pub fn with_runtime(
        ports: ReconcilerPorts,
        clock: Arc<dyn Clock>,
        runtime: ReconcilerRuntime,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            directory: ports.directory,
            intents: ports.intents,
            lanes: ports.lanes,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Re-issue every due intent once.
    pub async fn sweep(&self) -> Result<SweepReport, Error> {
        let now = self.clock.utc();
        let due = self
            .intents
            .due(now, self.config.batch_size)
            .await
            .map_err(map_store_error)?;

        let mut report = SweepReport::default();
        for intent in due {
            report.examined += 1;
            match self.reconcile(intent.id).await {
                IntentResolution::Applied => report.applied += 1,
                IntentResolution::Deferred => report.deferred += 1,
                IntentResolution::Flagged => report.flagged += 1,
                IntentResolution::Skipped => {}
            }
        }
        if report.examined > 0 {
            info!(
                examined = report.examined,
                applied = report.applied,
                deferred = report.deferred,
                flagged = report.flagged,
                "room status reconciliation sweep finished"
            );
        }
        Ok(report)
    }

    /// Sweep on the configured interval until `shutdown` turns true or its
    /// sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = u64::try_from(self.config.sweep_interval.as_millis()).unwrap_or(u64::MAX),
            "room status reconciler started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(err) = self.sweep().await {
                warn!(error = %err, "room status reconciliation sweep failed");
            }
            tokio::select! {
                () = self.sleeper.sleep(self.config.sweep_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("room status reconciler stopped");
    }

    async fn reconcile(&self, id: IntentId) -> IntentResolution {
        let Some(intent) = self.current(id).await else {
            return IntentResolution::Skipped;
        };
        let _lane = self.lanes.enter(intent.room_id).await;
        // Re-read under the lane: a newer request may have retired it.
        match self.current(id).await {
            Some(intent) => self.deliver(intent).await,
            None => IntentResolution::Skipped,
        }
    }

    /// The stored intent if it is still pending and due.
    async fn current(&self, id: IntentId) -> Option<RoomStatusIntent> {
        match self.intents.find(id).await {
            Ok(Some(intent))
                if intent.state == IntentState::Pending
                    && intent.next_attempt_at <= self.clock.utc() =>
            {
                Some(intent)
            }
            Ok(_) => None,
            Err(err) => {
                warn!(intent_id = %id, error = %err, "failed to re-read room status intent");
                None
            }
        }
    }

    async fn deliver(&self, mut intent: RoomStatusIntent) -> IntentResolution {
        let change = intent.change();
        let outcome =
            deliver_with_timeout(self.directory.as_ref(), &change, self.config.call_timeout).await;
        match outcome {
            Ok(room) => {
                if let Err(err) = self.intents.resolve(intent.id).await {
                    warn!(intent_id = %intent.id, error = %err, "failed to resolve reconciled intent");
                }
                info!(
                    intent_id = %intent.id,
                    origin = %intent.origin,
                    room_id = %room.id,
                    status = %room.status,
                    "room status intent reconciled"
                );
                IntentResolution::Applied
            }
            Err(reason) if reason.is_retryable() => {
                intent.attempts = intent.attempts.saturating_add(1);
                intent.last_error = Some(reason.to_string());
                if self
                    .config
                    .max_attempts
                    .is_some_and(|ceiling| intent.attempts >= ceiling)
                {
                    self.flag(intent, "retry ceiling reached").await;
                    return IntentResolution::Flagged;
                }
                let now = self.clock.utc();
                let delay = self.jitter.jittered_delay(
                    self.retry_base_delay(intent.attempts),
                    intent.attempts,
                    now,
                );
                intent.next_attempt_at = later_by(now, delay);
                if let Err(err) = self.intents.update(&intent).await {
                    warn!(intent_id = %intent.id, error = %err, "failed to reschedule intent");
                }
                IntentResolution::Deferred
            }
            Err(reason) => {
                let note = rejection_note(&reason);
                intent.last_error = Some(reason.to_string());
                self.flag(intent, note).await;
                IntentResolution::Flagged
            }
        }
    }

    async fn flag(&self, mut intent: RoomStatusIntent, note: &str) {
        intent.state = IntentState::NeedsAttention;
        warn!(
            intent_id = %intent.id,
            origin = %intent.origin,
            room_id = %intent.room_id,
            target = %intent.target,
            attempts = intent.attempts,
            last_error = intent.last_error.as_deref().unwrap_or_default(),
            note,
            "room status intent needs attention"
        );
        if let Err(err) = self.intents.update(&intent).await {
            warn!(intent_id = %intent.id, error = %err, "failed to flag intent");
        }
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

const fn rejection_note(reason: &RoomStatusError) -> &'static str {
    match reason {
        RoomStatusError::NotFound { .. } => "room no longer exists",
        RoomStatusError::Conflict { .. } => "room moved to an unexpected status",
        RoomStatusError::InvalidTransition { .. } => "room cannot make the requested move",
        RoomStatusError::Unavailable { .. } => "room directory unavailable",
    }
}

fn later_by(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl ReconciliationControl for Reconciler {
    async fn list_intents(&self) -> Result<Vec<RoomStatusIntent>, Error> {
        self.intents.list().await.map_err(map_store_error)
    }

    async fn sweep_now(&self) -> Result<SweepReport, Error> {
        self.sweep().await
    }

    async fn resolve_intent(&self, id: IntentId) -> Result<(), Error> {
        let removed = self.intents.resolve(id).await.map_err(map_store_error)?;
        if removed {
            info!(intent_id = %id, "room status intent resolved manually");
            Ok(())
        } else {
            Err(Error::not_found(format!("room intent {id} not found")))
        }
    }
}

#[cfg(test)]
mod tests;
