//! Booking orchestration.
//!
//! Each operation validates through the directories, commits the booking
//! locally and only then asks the room directory to follow through
//! [`RoomSync`].

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::directories::acquire_refusal;
use crate::domain::ports::{
    BookingFilter, BookingLifecycle, BookingRepository, BookingRepositoryError, BookingView,
    CreateBookingRequest, UpdateBookingRequest,
};
use crate::domain::room_sync::{OnRejection, RoomSync, SyncOutcome};
use crate::domain::{
    Booking, BookingDraft, BookingId, BookingStatus, Directories, Enricher, Error, IntentOrigin,
    RoomId, RoomStatus,
};

pub(crate) fn map_booking_repository_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("booking repository unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
        BookingRepositoryError::Missing { booking_id } => {
            Error::not_found(format!("booking {booking_id} not found"))
                .with_details(json!({ "bookingId": booking_id }))
        }
        BookingRepositoryError::RoomHeld {
            room_id,
            booking_id,
        } => Error::room_already_held(format!(
            "room {room_id} is already held by booking {booking_id}"
        ))
        .with_details(json!({ "roomId": room_id, "bookingId": booking_id })),
    }
}

/// Trim free-text notes, treating blank input as absent.
pub(crate) fn normalise_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Booking orchestrator.
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    directories: Directories,
    enricher: Enricher,
    room_sync: RoomSync,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    /// Wire the orchestrator to its store, the directories and room sync.
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        directories: Directories,
        room_sync: RoomSync,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let enricher = directories.enricher();
        Self {
            bookings,
            directories,
            enricher,
            room_sync,
            clock,
        }
    }

    async fn require_booking(&self, id: BookingId) -> Result<Booking, Error> {
        self.bookings
            .find_by_id(id)
            .await
            .map_err(map_booking_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("booking {id} not found"))
                    .with_details(json!({ "bookingId": id }))
            })
    }

    async fn view(&self, booking: Booking) -> BookingView {
        let display = self
            .enricher
            .describe(booking.customer_id, booking.room_id)
            .await
            .into_display();
        BookingView { booking, display }
    }

    /// Remove a booking whose room could not be acquired.
    async fn compensate(&self, id: BookingId) {
        match self.bookings.delete(id).await {
            Ok(_) => info!(booking_id = %id, "booking withdrawn after room acquire failed"),
            Err(err) => warn!(
                booking_id = %id,
                error = %err,
                "failed to withdraw booking after room acquire failed"
            ),
        }
    }

    async fn release(&self, booking: &Booking) -> Result<(), Error> {
        let outcome = self
            .room_sync
            .release(IntentOrigin::Booking(booking.id), booking.room_id)
            .await?;
        log_follow_up(booking.id, booking.room_id, &outcome);
        Ok(())
    }

    async fn move_room(&self, booking: &Booking, previous: RoomId) -> Result<(), Error> {
        let origin = IntentOrigin::Booking(booking.id);
        let released = self.room_sync.release(origin, previous).await?;
        log_follow_up(booking.id, previous, &released);
        let acquired = self
            .room_sync
            .acquire(
                origin,
                booking.room_id,
                RoomStatus::Available,
                RoomStatus::Booked,
                OnRejection::Flag,
            )
            .await?;
        log_follow_up(booking.id, booking.room_id, &acquired);
        Ok(())
    }
}

fn log_follow_up(booking_id: BookingId, room_id: RoomId, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Applied(room) => {
            info!(booking_id = %booking_id, room_id = %room_id, status = %room.status, "room follows booking");
        }
        SyncOutcome::Deferred { intent_id, .. } => {
            info!(booking_id = %booking_id, room_id = %room_id, intent_id = %intent_id, "room update left for reconciliation");
        }
        SyncOutcome::Rejected(reason) => {
            warn!(booking_id = %booking_id, room_id = %room_id, error = %reason, "room update refused; intent flagged");
        }
    }
}

#[async_trait]
impl BookingLifecycle for BookingService {
    async fn create_booking(&self, request: CreateBookingRequest) -> Result<BookingView, Error> {
        self.directories
            .require_customer(request.customer_id)
            .await?;
        self.directories
            .require_available_room(request.room_id)
            .await?;
        self.room_sync
            .ensure_no_pending_acquire(request.room_id)
            .await?;

        let booking = self
            .bookings
            .insert(BookingDraft {
                customer_id: request.customer_id,
                room_id: request.room_id,
                booking_date: self.clock.utc(),
                check_in_date: request.check_in_date,
                status: BookingStatus::Pending,
                notes: normalise_notes(request.notes),
            })
            .await
            .map_err(map_booking_repository_error)?;

        let outcome = self
            .room_sync
            .acquire(
                IntentOrigin::Booking(booking.id),
                booking.room_id,
                RoomStatus::Available,
                RoomStatus::Booked,
                OnRejection::Discard,
            )
            .await;
        match outcome {
            Ok(SyncOutcome::Rejected(reason)) => {
                self.compensate(booking.id).await;
                return Err(acquire_refusal(reason));
            }
            Err(err) => {
                self.compensate(booking.id).await;
                return Err(err);
            }
            Ok(_) => {}
        }

        info!(
            booking_id = %booking.id,
            customer_id = %booking.customer_id,
            room_id = %booking.room_id,
            "booking created"
        );
        Ok(self.view(booking).await)
    }

    async fn update_booking(
        &self,
        id: BookingId,
        request: UpdateBookingRequest,
    ) -> Result<BookingView, Error> {
        let mut booking = self.require_booking(id).await?;
        let previous_room = booking.room_id;
        let room_changed = request.room_id != previous_room;
        if room_changed {
            if booking.status.is_terminal() {
                return Err(Error::invalid_transition(format!(
                    "booking {id} is {:?} and cannot change rooms",
                    booking.status
                ))
                .with_details(json!({ "bookingId": id, "status": booking.status })));
            }
            self.directories
                .require_available_room(request.room_id)
                .await?;
            self.room_sync
                .ensure_no_pending_acquire(request.room_id)
                .await?;
        }

        booking.room_id = request.room_id;
        booking.check_in_date = request.check_in_date;
        booking.notes = normalise_notes(request.notes);
        self.bookings
            .update(&booking)
            .await
            .map_err(map_booking_repository_error)?;

        if room_changed {
            self.move_room(&booking, previous_room).await?;
            info!(booking_id = %id, from = %previous_room, to = %booking.room_id, "booking moved rooms");
        }
        Ok(self.view(booking).await)
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<BookingView, Error> {
        let mut booking = self.require_booking(id).await?;
        if booking.status == status {
            return Ok(self.view(booking).await);
        }
        let refuse = |reason: &str| {
            Error::invalid_transition(format!("booking {id}: {reason}"))
                .with_details(json!({ "bookingId": id, "from": booking.status, "to": status }))
        };
        if status == BookingStatus::CheckedIn {
            return Err(refuse("check-in goes through the check-in service"));
        }
        if booking.status.is_terminal() {
            return Err(refuse("the booking is already closed"));
        }
        if status == BookingStatus::Pending {
            return Err(refuse("a booking cannot return to pending"));
        }

        booking.status = status;
        self.bookings
            .update(&booking)
            .await
            .map_err(map_booking_repository_error)?;
        if status == BookingStatus::Cancelled {
            self.release(&booking).await?;
        }
        info!(booking_id = %id, status = ?status, "booking status changed");
        Ok(self.view(booking).await)
    }

    async fn delete_booking(&self, id: BookingId) -> Result<(), Error> {
        let booking = self.require_booking(id).await?;
        if booking.status.holds_room() {
            // Releases even when a check-in has moved the room to Occupied.
            self.release(&booking).await?;
        }
        self.bookings
            .delete(id)
            .await
            .map_err(map_booking_repository_error)?;
        info!(booking_id = %id, room_id = %booking.room_id, "booking deleted");
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> Result<BookingView, Error> {
        let booking = self.require_booking(id).await?;
        Ok(self.view(booking).await)
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<BookingView>, Error> {
        let bookings = self
            .bookings
            .list(filter)
            .await
            .map_err(map_booking_repository_error)?;
        Ok(join_all(bookings.into_iter().map(|booking| self.view(booking))).await)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
