//! Post-commit room status synchronisation.
//!
//! After an orchestrator commits its own record it asks the room directory to
//! move the room. [`RoomSync`] records an intent first, then issues the
//! compare-and-set with a bounded timeout. The whole step runs on a spawned
//! task: the caller awaits the outcome, but dropping the caller's future does
//! not cancel a request that may already be in flight.
//!
//! Deliveries for one room are serialised through [`RoomLanes`], which the
//! reconciler shares, so a newer request always lands after an older one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mockable::Clock;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use crate::domain::ports::{RoomDirectory, RoomIntentStore, RoomStatusError};
use crate::domain::{
    Error, IntentId, IntentOrigin, IntentState, Room, RoomId, RoomStatus, RoomStatusChange,
    RoomStatusIntent, RoomStatusIntentDraft, TraceId,
};

/// What to do with the intent when the directory refuses the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnRejection {
    /// Drop the intent; the caller compensates its own records.
    Discard,
    /// Keep the intent and flag it for manual attention.
    Flag,
}

/// Result of one synchronisation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The directory confirmed the change.
    Applied(Room),
    /// The directory could not be reached; the intent stays pending.
    Deferred {
        /// Pending intent the reconciler will re-issue.
        intent_id: IntentId,
        /// Why delivery failed.
        reason: RoomStatusError,
    },
    /// The directory refused the change.
    Rejected(RoomStatusError),
}

/// Per-room ordering for status deliveries.
///
/// Clones share the same lanes. Holding a lane covers recording an intent,
/// retiring the ones it supersedes and one bounded directory call.
#[derive(Clone, Default)]
pub struct RoomLanes {
    lanes: Arc<Mutex<HashMap<RoomId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl RoomLanes {
    /// Wait for exclusive use of `room_id`'s lane.
    pub async fn enter(&self, room_id: RoomId) -> OwnedMutexGuard<()> {
        let lane = self
            .lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(room_id)
            .or_default()
            .clone();
        lane.lock_owned().await
    }
}

/// Records room-status intents and delivers them to the room directory.
#[derive(Clone)]
pub struct RoomSync {
    directory: Arc<dyn RoomDirectory>,
    intents: Arc<dyn RoomIntentStore>,
    lanes: RoomLanes,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl RoomSync {
    /// Build a synchroniser whose directory calls are bounded by `timeout`.
    ///
    /// `lanes` must be the same value handed to the reconciler.
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        intents: Arc<dyn RoomIntentStore>,
        lanes: RoomLanes,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            intents,
            lanes,
            clock,
            timeout,
        }
    }

    /// Refuse with `room_already_held` while an undelivered acquire targets
    /// `room_id`.
    ///
    /// # Errors
    ///
    /// Returns `room_already_held` for a pending acquire and
    /// `service_unavailable` when the intent store cannot be read.
    pub async fn ensure_no_pending_acquire(&self, room_id: RoomId) -> Result<(), Error> {
        let intents = self.intents.list().await.map_err(|err| {
            Error::service_unavailable(format!("room intent store unavailable: {err}"))
        })?;
        let pending = intents.iter().rev().find(|intent| {
            intent.room_id == room_id && intent.state == IntentState::Pending
        });
        match pending {
            Some(intent) if intent.target != RoomStatus::Available => Err(
                Error::room_already_held(format!(
                    "room {room_id} has an undelivered change to {}",
                    intent.target
                ))
                .with_details(serde_json::json!({
                    "roomId": room_id,
                    "intentId": intent.id,
                    "target": intent.target,
                })),
            ),
            _ => Ok(()),
        }
    }

    /// Return `room_id` to Available with no expectation.
    ///
    /// Refusals are flagged: a release has nothing to compensate.
    pub async fn release(&self, origin: IntentOrigin, room_id: RoomId) -> Result<SyncOutcome, Error> {
        self.apply(origin, RoomStatusChange::release(room_id), OnRejection::Flag)
            .await
    }

    /// Move `room_id` from `expected` to `target`.
    pub async fn acquire(
        &self,
        origin: IntentOrigin,
        room_id: RoomId,
        expected: RoomStatus,
        target: RoomStatus,
        on_rejection: OnRejection,
    ) -> Result<SyncOutcome, Error> {
        self.apply(
            origin,
            RoomStatusChange::acquire(room_id, expected, target),
            on_rejection,
        )
        .await
    }

    /// Record and deliver `change` on a detached task.
    pub async fn apply(
        &self,
        origin: IntentOrigin,
        change: RoomStatusChange,
        on_rejection: OnRejection,
    ) -> Result<SyncOutcome, Error> {
        let this = self.clone();
        let step = async move { this.run(origin, change, on_rejection).await };
        let handle = match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, step)),
            None => tokio::spawn(step),
        };
        handle
            .await
            .map_err(|err| Error::internal(format!("room sync task failed: {err}")))?
    }

    async fn run(
        &self,
        origin: IntentOrigin,
        change: RoomStatusChange,
        on_rejection: OnRejection,
    ) -> Result<SyncOutcome, Error> {
        let _lane = self.lanes.enter(change.room_id).await;
        let draft = RoomStatusIntentDraft { origin, change };
        let intent = match self.record(draft).await {
            Ok(intent) => Some(intent),
            Err(err) => {
                error!(
                    %origin,
                    room_id = %change.room_id,
                    target = %change.target,
                    error = %err,
                    "failed to record room status intent; delivering without one"
                );
                None
            }
        };

        match self.deliver(&change).await {
            Ok(room) => {
                if let Some(recorded) = &intent {
                    self.resolve(recorded).await;
                }
                info!(%origin, room_id = %room.id, status = %room.status, "room status synchronised");
                Ok(SyncOutcome::Applied(room))
            }
            Err(reason) if reason.is_retryable() => {
                let recorded = self.require_intent(intent, draft, &reason).await?;
                let intent_id = self.defer(recorded, &reason).await;
                warn!(
                    %origin,
                    room_id = %change.room_id,
                    target = %change.target,
                    %intent_id,
                    error = %reason,
                    "room directory unavailable; room status change deferred"
                );
                Ok(SyncOutcome::Deferred { intent_id, reason })
            }
            Err(reason) => {
                match on_rejection {
                    OnRejection::Discard => {
                        if let Some(recorded) = &intent {
                            self.resolve(recorded).await;
                        }
                    }
                    OnRejection::Flag => {
                        let recorded = self.require_intent(intent, draft, &reason).await?;
                        self.flag(recorded, &reason).await;
                    }
                }
                warn!(
                    %origin,
                    room_id = %change.room_id,
                    target = %change.target,
                    error = %reason,
                    "room directory refused status change"
                );
                Ok(SyncOutcome::Rejected(reason))
            }
        }
    }

    /// Record a new intent and retire the older ones it supersedes.
    async fn record(&self, draft: RoomStatusIntentDraft) -> Result<RoomStatusIntent, Error> {
        let intent = self
            .intents
            .record(draft, self.clock.utc())
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?;
        match self.intents.supersede(&intent).await {
            Ok(retired) if !retired.is_empty() => {
                info!(
                    intent_id = %intent.id,
                    room_id = %intent.room_id,
                    retired = ?retired,
                    "older room status intents superseded"
                );
            }
            Ok(_) => {}
            Err(err) => {
                warn!(intent_id = %intent.id, error = %err, "failed to retire superseded intents");
            }
        }
        Ok(intent)
    }

    /// The intent a failed delivery must leave behind, recording it again if
    /// the first attempt failed.
    async fn require_intent(
        &self,
        intent: Option<RoomStatusIntent>,
        draft: RoomStatusIntentDraft,
        reason: &RoomStatusError,
    ) -> Result<RoomStatusIntent, Error> {
        if let Some(recorded) = intent {
            return Ok(recorded);
        }
        self.record(draft).await.map_err(|err| {
            error!(
                origin = %draft.origin,
                room_id = %draft.change.room_id,
                target = %draft.change.target,
                error = %err,
                delivery_error = %reason,
                "room status change neither delivered nor recorded"
            );
            Error::service_unavailable(format!(
                "room {} was not updated and the change could not be recorded",
                draft.change.room_id
            ))
            .with_details(serde_json::json!({
                "roomId": draft.change.room_id,
                "target": draft.change.target,
            }))
        })
    }

    async fn deliver(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError> {
        deliver_with_timeout(self.directory.as_ref(), change, self.timeout).await
    }

    async fn resolve(&self, intent: &RoomStatusIntent) {
        if let Err(err) = self.intents.resolve(intent.id).await {
            warn!(intent_id = %intent.id, error = %err, "failed to resolve room status intent");
        }
    }

    async fn defer(&self, mut intent: RoomStatusIntent, reason: &RoomStatusError) -> IntentId {
        intent.attempts = intent.attempts.saturating_add(1);
        intent.last_error = Some(reason.to_string());
        if let Err(err) = self.intents.update(&intent).await {
            warn!(intent_id = %intent.id, error = %err, "failed to update deferred room status intent");
        }
        intent.id
    }

    async fn flag(&self, mut intent: RoomStatusIntent, reason: &RoomStatusError) {
        intent.state = IntentState::NeedsAttention;
        intent.last_error = Some(reason.to_string());
        if let Err(err) = self.intents.update(&intent).await {
            warn!(intent_id = %intent.id, error = %err, "failed to flag room status intent");
        }
    }
}

/// Issue `change` against `directory`, mapping an elapsed timeout to
/// [`RoomStatusError::Unavailable`].
pub(crate) async fn deliver_with_timeout(
    directory: &dyn RoomDirectory,
    change: &RoomStatusChange,
    timeout: Duration,
) -> Result<Room, RoomStatusError> {
    tokio::time::timeout(timeout, directory.set_status(change))
        .await
        .unwrap_or_else(|_| {
            Err(RoomStatusError::unavailable(format!(
                "room directory did not answer within {}ms",
                timeout.as_millis()
            )))
        })
}

#[cfg(test)]
#[path = "room_sync_tests.rs"]
mod tests;
