//! DTOs for decoding refusal details returned by the room directory.
//!
//! A refused status change comes back as the shared error payload; its
//! `details` object carries the fields needed to rebuild the port error.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::RoomStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConflictDetailsDto {
    pub(super) current_status: RoomStatus,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransitionDetailsDto {
    pub(super) from: RoomStatus,
    pub(super) to: RoomStatus,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) details: Option<Value>,
}

impl ErrorBodyDto {
    /// Decode the `details` object of an error body into `T`.
    pub(super) fn details_as<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Option<T> {
        let decoded: Self = serde_json::from_slice(body).ok()?;
        serde_json::from_value(decoded.details?).ok()
    }
}
