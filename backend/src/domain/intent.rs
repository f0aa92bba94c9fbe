//! Recorded room-status intents.
//!
//! An intent is written before an orchestrator asks the room directory to
//! change a status. It is removed once the directory confirms the change and
//! otherwise left for the reconciler to re-issue.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, CheckInId, IntentId, RoomId, RoomStatus, RoomStatusChange};

/// Local record on whose behalf a room status change was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum IntentOrigin {
    /// Raised by the booking orchestrator.
    Booking(BookingId),
    /// Raised by the check-in orchestrator.
    CheckIn(CheckInId),
}

impl fmt::Display for IntentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booking(id) => write!(f, "booking {id}"),
            Self::CheckIn(id) => write!(f, "check-in {id}"),
        }
    }
}

/// Reconciliation state of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentState {
    /// Awaiting (re)delivery to the room directory.
    Pending,
    /// Rejected or out of retries; an operator must resolve it.
    NeedsAttention,
}

/// A room status change that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusIntent {
    /// Store-assigned identifier.
    pub id: IntentId,
    /// Record that asked for the change.
    pub origin: IntentOrigin,
    /// Room to update.
    pub room_id: RoomId,
    /// Status the change is conditional on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<RoomStatus>,
    /// Requested status.
    pub target: RoomStatus,
    /// When the intent was written.
    pub recorded_at: DateTime<Utc>,
    /// Delivery attempts that failed so far.
    pub attempts: u32,
    /// Earliest time the reconciler may retry.
    pub next_attempt_at: DateTime<Utc>,
    /// Most recent delivery error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Reconciliation state.
    pub state: IntentState,
}

impl RoomStatusIntent {
    /// The directory request this intent stands for.
    #[must_use]
    pub const fn change(&self) -> RoomStatusChange {
        RoomStatusChange {
            room_id: self.room_id,
            expected: self.expected,
            target: self.target,
        }
    }

    /// True when the reconciler should attempt delivery at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == IntentState::Pending && self.next_attempt_at <= now
    }
}

/// Intent fields before the store assigns an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStatusIntentDraft {
    /// Record that asked for the change.
    pub origin: IntentOrigin,
    /// The directory request.
    pub change: RoomStatusChange,
}

impl RoomStatusIntentDraft {
    /// Attach identifier and timestamps; the intent is due immediately.
    #[must_use]
    pub const fn into_intent(self, id: IntentId, recorded_at: DateTime<Utc>) -> RoomStatusIntent {
        RoomStatusIntent {
            id,
            origin: self.origin,
            room_id: self.change.room_id,
            expected: self.change.expected,
            target: self.change.target,
            recorded_at,
            attempts: 0,
            next_attempt_at: recorded_at,
            last_error: None,
            state: IntentState::Pending,
        }
    }
}
