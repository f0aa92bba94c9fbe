//! Room directory service.
//!
//! Owns room identity and status. Orchestrators in this process reach it
//! through the [`RoomDirectory`] port; the HTTP surface reaches it through
//! [`RoomAdministration`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    DirectoryError, RoomAdministration, RoomDirectory, RoomFilter, RoomRepository,
    RoomRepositoryError, RoomStatusError, StatusSwap,
};
use crate::domain::{
    Error, Room, RoomDraft, RoomId, RoomStatus, RoomStatusChange, StatusDecision, StatusRejection,
    evaluate_status_change,
};

/// Upper bound on swap retries when concurrent writers keep moving a room.
const MAX_SWAP_ATTEMPTS: usize = 8;

fn map_repository_error(error: RoomRepositoryError) -> Error {
    match error {
        RoomRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("room repository unavailable: {message}"))
        }
        RoomRepositoryError::Query { message } => {
            Error::internal(format!("room repository error: {message}"))
        }
        RoomRepositoryError::DuplicateNumber { room_number } => {
            Error::conflict(format!("room number {room_number} is already registered"))
                .with_details(json!({ "roomNumber": room_number }))
        }
    }
}

/// Translate a refused status change into a domain error.
///
/// The details carry enough structure for a remote caller to rebuild the
/// original [`RoomStatusError`].
pub fn room_status_error_to_domain(error: RoomStatusError) -> Error {
    let message = error.to_string();
    match error {
        RoomStatusError::NotFound { room_id } => {
            Error::not_found(message).with_details(json!({ "roomId": room_id }))
        }
        RoomStatusError::Conflict { room_id, current } => Error::conflict(message)
            .with_details(json!({ "roomId": room_id, "currentStatus": current })),
        RoomStatusError::InvalidTransition { room_id, from, to } => Error::invalid_transition(message)
            .with_details(json!({ "roomId": room_id, "from": from, "to": to })),
        RoomStatusError::Unavailable { .. } => Error::service_unavailable(message),
    }
}

/// Room directory backed by a [`RoomRepository`].
#[derive(Clone)]
pub struct RoomDirectoryService {
    rooms: Arc<dyn RoomRepository>,
}

impl RoomDirectoryService {
    /// Create a directory over the given repository.
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    async fn apply_change(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError> {
        let room_id = change.room_id;
        let mut room = self
            .rooms
            .find_by_id(room_id)
            .await
            .map_err(|err| RoomStatusError::unavailable(err.to_string()))?
            .ok_or_else(|| RoomStatusError::not_found(room_id))?;

        for _ in 0..MAX_SWAP_ATTEMPTS {
            match evaluate_status_change(room.status, change.expected, change.target) {
                Ok(StatusDecision::Unchanged) => return Ok(room),
                Ok(StatusDecision::Apply) => {}
                Err(StatusRejection::Conflict { current }) => {
                    return Err(RoomStatusError::conflict(room_id, current));
                }
                Err(StatusRejection::InvalidTransition { from, to }) => {
                    return Err(RoomStatusError::invalid_transition(room_id, from, to));
                }
            }

            let swap = self
                .rooms
                .swap_status(room_id, room.status, change.target)
                .await
                .map_err(|err| RoomStatusError::unavailable(err.to_string()))?;
            match swap {
                StatusSwap::Swapped(updated) => {
                    info!(
                        room_id = %room_id,
                        from = %room.status,
                        to = %updated.status,
                        "room status changed"
                    );
                    return Ok(updated);
                }
                StatusSwap::Stale(fresh) => room = fresh,
                StatusSwap::Missing => return Err(RoomStatusError::not_found(room_id)),
            }
        }

        Err(RoomStatusError::unavailable(format!(
            "room {room_id} kept changing under concurrent updates"
        )))
    }

    async fn require_room(&self, id: RoomId) -> Result<Room, Error> {
        self.rooms
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("room {id} not found")))
    }
}

#[async_trait]
impl RoomDirectory for RoomDirectoryService {
    async fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, DirectoryError> {
        self.rooms
            .find_by_id(id)
            .await
            .map_err(|err| DirectoryError::unavailable(err.to_string()))
    }

    async fn set_status(&self, change: &RoomStatusChange) -> Result<Room, RoomStatusError> {
        self.apply_change(change).await
    }
}

#[async_trait]
impl RoomAdministration for RoomDirectoryService {
    async fn register_room(&self, draft: RoomDraft) -> Result<Room, Error> {
        let room_number = draft.room_number.trim();
        if room_number.is_empty() {
            return Err(Error::invalid_request("room number must not be blank"));
        }
        let draft = RoomDraft {
            room_number: room_number.to_owned(),
            ..draft
        };
        let room = self.rooms.insert(draft).await.map_err(map_repository_error)?;
        info!(room_id = %room.id, room_number = %room.room_number, "room registered");
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Room, Error> {
        self.require_room(id).await
    }

    async fn get_room_by_number(&self, room_number: &str) -> Result<Room, Error> {
        self.rooms
            .find_by_number(room_number.trim())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("room number {room_number} not found")))
    }

    async fn list_rooms(&self, filter: RoomFilter) -> Result<Vec<Room>, Error> {
        let rooms = self.rooms.list().await.map_err(map_repository_error)?;
        Ok(match filter {
            RoomFilter::All => rooms,
            RoomFilter::Status(status) => rooms
                .into_iter()
                .filter(|room| room.status == status)
                .collect(),
        })
    }

    async fn change_status(&self, change: RoomStatusChange) -> Result<Room, Error> {
        self.apply_change(&change)
            .await
            .map_err(room_status_error_to_domain)
    }

    async fn start_maintenance(&self, id: RoomId) -> Result<Room, Error> {
        self.change_status(RoomStatusChange::acquire(
            id,
            RoomStatus::Available,
            RoomStatus::Maintenance,
        ))
        .await
    }

    async fn finish_maintenance(&self, id: RoomId) -> Result<Room, Error> {
        self.change_status(RoomStatusChange::acquire(
            id,
            RoomStatus::Maintenance,
            RoomStatus::Available,
        ))
        .await
    }
}

#[cfg(test)]
#[path = "room_directory_service_tests.rs"]
mod tests;
