//! Room records and the occupancy state machine.
//!
//! The room directory is the single owner of a room's status. Every other
//! component changes it through a compare-and-set request evaluated by
//! [`evaluate_status_change`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Amount, RoomId};

/// Occupancy status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Free to be booked or occupied.
    Available,
    /// Held by a pending booking.
    Booked,
    /// Held by an active check-in.
    Occupied,
    /// Withdrawn from service by an administrator.
    Maintenance,
}

impl RoomStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Available,
        Self::Booked,
        Self::Occupied,
        Self::Maintenance,
    ];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Booked => "BOOKED",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
        }
    }

    /// True when `self -> target` is an edge of the state machine.
    ///
    /// Staying in place is not an edge; callers treat it as a no-op before
    /// asking.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Available, Self::Booked | Self::Occupied | Self::Maintenance)
                | (Self::Booked, Self::Occupied | Self::Available)
                | (Self::Occupied | Self::Maintenance, Self::Available)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown room status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room status: {0}")]
pub struct RoomStatusParseError(pub String);

impl FromStr for RoomStatus {
    type Err = RoomStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RoomStatusParseError(wanted.to_owned()))
    }
}

/// A rentable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Store-assigned identifier.
    pub id: RoomId,
    /// Human-facing room number, unique per directory.
    pub room_number: String,
    /// Monthly rent in minor currency units.
    pub monthly_price: Amount,
    /// Current occupancy status.
    pub status: RoomStatus,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Administrative registration payload for a new room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDraft {
    /// Human-facing room number.
    pub room_number: String,
    /// Monthly rent in minor currency units.
    pub monthly_price: Amount,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Conditional status update addressed to the room directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusChange {
    /// Room to update.
    pub room_id: RoomId,
    /// Status the caller believes is current; `None` skips the comparison.
    #[serde(default)]
    pub expected: Option<RoomStatus>,
    /// Requested status.
    pub target: RoomStatus,
}

impl RoomStatusChange {
    /// Unconditional release back to [`RoomStatus::Available`].
    #[must_use]
    pub const fn release(room_id: RoomId) -> Self {
        Self {
            room_id,
            expected: None,
            target: RoomStatus::Available,
        }
    }

    /// Conditional move from `expected` to `target`.
    #[must_use]
    pub const fn acquire(room_id: RoomId, expected: RoomStatus, target: RoomStatus) -> Self {
        Self {
            room_id,
            expected: Some(expected),
            target,
        }
    }
}

/// Verdict of [`evaluate_status_change`] for an existing room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDecision {
    /// Already in the requested status; nothing to write.
    Unchanged,
    /// Swap the stored status to the target.
    Apply,
}

/// Why a status change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRejection {
    /// The caller's expectation did not match the current status.
    Conflict {
        /// Status actually held.
        current: RoomStatus,
    },
    /// The requested move is not an edge of the state machine.
    InvalidTransition {
        /// Status actually held.
        from: RoomStatus,
        /// Requested status.
        to: RoomStatus,
    },
}

/// Decide how to treat `expected -> target` for a room currently in `current`.
///
/// Re-applying the current status succeeds even when `expected` names an
/// earlier state, so a retried request that already landed stays a success.
///
/// # Examples
/// ```
/// use rentals::domain::{evaluate_status_change, RoomStatus, StatusDecision, StatusRejection};
///
/// assert_eq!(
///     evaluate_status_change(RoomStatus::Booked, Some(RoomStatus::Available), RoomStatus::Booked),
///     Ok(StatusDecision::Unchanged)
/// );
/// assert_eq!(
///     evaluate_status_change(RoomStatus::Booked, Some(RoomStatus::Available), RoomStatus::Occupied),
///     Err(StatusRejection::Conflict { current: RoomStatus::Booked })
/// );
/// ```
pub fn evaluate_status_change(
    current: RoomStatus,
    expected: Option<RoomStatus>,
    target: RoomStatus,
) -> Result<StatusDecision, StatusRejection> {
    if current == target {
        return Ok(StatusDecision::Unchanged);
    }
    if expected.is_some_and(|wanted| wanted != current) {
        return Err(StatusRejection::Conflict { current });
    }
    if current.can_transition_to(target) {
        Ok(StatusDecision::Apply)
    } else {
        Err(StatusRejection::InvalidTransition {
            from: current,
            to: target,
        })
    }
}
