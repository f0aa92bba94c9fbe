//! Precondition reads against the customer and room directories.
//!
//! Every orchestrator validates the records it references before it writes.
//! An unreachable directory at this stage aborts the operation before any
//! local change is made.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::ports::{CustomerDirectory, DirectoryError, RoomDirectory, RoomStatusError};
use super::room_directory_service::room_status_error_to_domain;
use super::{Customer, CustomerId, Enricher, Error, Room, RoomId, RoomStatus};

/// Customer and room directories with a shared call timeout.
#[derive(Clone)]
pub struct Directories {
    customers: Arc<dyn CustomerDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    timeout: Duration,
}

impl Directories {
    /// Bundle both directories; each read is bounded by `timeout`.
    pub fn new(
        customers: Arc<dyn CustomerDirectory>,
        rooms: Arc<dyn RoomDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            customers,
            rooms,
            timeout,
        }
    }

    /// The room directory, for status synchronisation.
    pub fn rooms(&self) -> Arc<dyn RoomDirectory> {
        Arc::clone(&self.rooms)
    }

    /// An enricher reading from the same directories.
    pub fn enricher(&self) -> Enricher {
        Enricher::new(
            Arc::clone(&self.customers),
            Arc::clone(&self.rooms),
            self.timeout,
        )
    }

    /// Resolve a customer or fail with `not_found` / `service_unavailable`.
    pub async fn require_customer(&self, id: CustomerId) -> Result<Customer, Error> {
        self.bounded(self.customers.get_by_id(id))
            .await
            .map_err(|err| unavailable("customer", &err))?
            .ok_or_else(|| {
                Error::not_found(format!("customer {id} not found"))
                    .with_details(json!({ "customerId": id }))
            })
    }

    /// Resolve a room or fail with `not_found` / `service_unavailable`.
    pub async fn require_room(&self, id: RoomId) -> Result<Room, Error> {
        self.bounded(self.rooms.get_by_id(id))
            .await
            .map_err(|err| unavailable("room", &err))?
            .ok_or_else(|| {
                Error::not_found(format!("room {id} not found")).with_details(json!({ "roomId": id }))
            })
    }

    /// Resolve a room that nobody holds.
    ///
    /// A room in any status other than Available yields `room_already_held`.
    pub async fn require_available_room(&self, id: RoomId) -> Result<Room, Error> {
        let room = self.require_room(id).await?;
        if room.status == RoomStatus::Available {
            Ok(room)
        } else {
            Err(room_already_held(id, room.status))
        }
    }

    async fn bounded<T, F>(&self, lookup: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, DirectoryError>>,
    {
        tokio::time::timeout(self.timeout, lookup)
            .await
            .unwrap_or_else(|_| {
                Err(DirectoryError::timeout(format!(
                    "no answer within {}ms",
                    self.timeout.as_millis()
                )))
            })
    }
}

fn unavailable(directory: &str, err: &DirectoryError) -> Error {
    Error::service_unavailable(format!("{directory} directory unavailable: {err}"))
}

fn room_already_held(room_id: RoomId, current: RoomStatus) -> Error {
    Error::room_already_held(format!("room {room_id} is not available (currently {current})"))
        .with_details(json!({ "roomId": room_id, "currentStatus": current }))
}

/// Translate a refused acquire into the error returned to the caller.
///
/// Losing the compare-and-set race means somebody else holds the room.
pub(crate) fn acquire_refusal(error: RoomStatusError) -> Error {
    match error {
        RoomStatusError::Conflict { room_id, current } => room_already_held(room_id, current),
        other => room_status_error_to_domain(other),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockCustomerDirectory, MockRoomDirectory};
    use crate::domain::Amount;
    use rstest::rstest;

    fn room(status: RoomStatus) -> Room {
        Room {
            id: RoomId::new(10),
            room_number: "101".to_owned(),
            monthly_price: Amount::new(450_000),
            status,
            description: None,
        }
    }

    fn directories(customers: MockCustomerDirectory, rooms: MockRoomDirectory) -> Directories {
        Directories::new(Arc::new(customers), Arc::new(rooms), Duration::from_secs(1))
    }

    #[rstest]
    #[case(RoomStatus::Booked)]
    #[case(RoomStatus::Occupied)]
    #[case(RoomStatus::Maintenance)]
    #[tokio::test]
    async fn held_rooms_are_refused(#[case] status: RoomStatus) {
        let mut rooms = MockRoomDirectory::new();
        rooms
            .expect_get_by_id()
            .return_once(move |_| Ok(Some(room(status))));

        let err = directories(MockCustomerDirectory::new(), rooms)
            .require_available_room(RoomId::new(10))
            .await
            .expect_err("room is held");

        assert_eq!(err.code(), ErrorCode::RoomAlreadyHeld);
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_directory_is_service_unavailable() {
        let mut customers = MockCustomerDirectory::new();
        customers
            .expect_get_by_id()
            .return_once(|_| Err(DirectoryError::unavailable("connection refused")));

        let err = directories(customers, MockRoomDirectory::new())
            .require_customer(CustomerId::new(1))
            .await
            .expect_err("directory down");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_customer_is_not_found() {
        let mut customers = MockCustomerDirectory::new();
        customers.expect_get_by_id().return_once(|_| Ok(None));

        let err = directories(customers, MockRoomDirectory::new())
            .require_customer(CustomerId::new(1))
            .await
            .expect_err("no such customer");

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.details(), Some(&json!({ "customerId": 1 })));
    }

    #[rstest]
    fn lost_race_reads_as_room_already_held() {
        let err = acquire_refusal(RoomStatusError::conflict(RoomId::new(10), RoomStatus::Booked));
        assert_eq!(err.code(), ErrorCode::RoomAlreadyHeld);

        let err = acquire_refusal(RoomStatusError::not_found(RoomId::new(10)));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
