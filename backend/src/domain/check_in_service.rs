//! Check-in orchestration.
//!
//! A check-in always has a backing booking: walk-ins get one created on the
//! spot, marked CheckedIn. The room moves to Occupied on arrival and back to
//! Available on check-out.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::booking_service::map_booking_repository_error;
use crate::domain::directories::acquire_refusal;
use crate::domain::ports::{
    BookingRepository, CheckInFilter, CheckInLifecycle, CheckInRepository, CheckInRepositoryError,
    CheckInView, CreateCheckInRequest, RoomStatusError, UpdateCheckInRequest,
};
use crate::domain::room_sync::{OnRejection, RoomSync, SyncOutcome};
use crate::domain::{
    Booking, BookingDraft, BookingId, BookingStatus, CheckIn, CheckInDraft, CheckInId,
    CheckInStatus, Directories, Enricher, Error, IntentOrigin, RoomId, RoomStatus, StayPolicy,
    WALK_IN_NOTE,
};

fn map_check_in_repository_error(error: CheckInRepositoryError) -> Error {
    match error {
        CheckInRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("check-in repository unavailable: {message}"))
        }
        CheckInRepositoryError::Query { message } => {
            Error::internal(format!("check-in repository error: {message}"))
        }
        CheckInRepositoryError::Missing { check_in_id } => {
            Error::not_found(format!("check-in {check_in_id} not found"))
                .with_details(json!({ "checkInId": check_in_id }))
        }
    }
}

/// Check-in orchestrator.
#[derive(Clone)]
pub struct CheckInService {
    check_ins: Arc<dyn CheckInRepository>,
    bookings: Arc<dyn BookingRepository>,
    directories: Directories,
    enricher: Enricher,
    room_sync: RoomSync,
    clock: Arc<dyn Clock>,
    stay: StayPolicy,
}

impl CheckInService {
    /// Wire the orchestrator to its stores, the directories and room sync.
    pub fn new(
        check_ins: Arc<dyn CheckInRepository>,
        bookings: Arc<dyn BookingRepository>,
        directories: Directories,
        room_sync: RoomSync,
        clock: Arc<dyn Clock>,
        stay: StayPolicy,
    ) -> Self {
        let enricher = directories.enricher();
        Self {
            check_ins,
            bookings,
            directories,
            enricher,
            room_sync,
            clock,
            stay,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    fn expected_check_out(&self, check_in_date: NaiveDate) -> Result<NaiveDate, Error> {
        self.stay.expected_check_out(check_in_date).ok_or_else(|| {
            Error::invalid_request(format!(
                "stay starting {check_in_date} runs past the supported calendar"
            ))
        })
    }

    async fn require_check_in(&self, id: CheckInId) -> Result<CheckIn, Error> {
        self.check_ins
            .find_by_id(id)
            .await
            .map_err(map_check_in_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("check-in {id} not found"))
                    .with_details(json!({ "checkInId": id }))
            })
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

    async fn view(&self, check_in: CheckIn) -> CheckInView {
        let display = self
            .enricher
            .describe(check_in.customer_id, check_in.room_id)
            .await
            .into_display();
        CheckInView { check_in, display }
    }

    async fn discard_check_in(&self, id: CheckInId) {
        if let Err(err) = self.check_ins.delete(id).await {
            warn!(check_in_id = %id, error = %err, "failed to withdraw check-in");
        }
    }

    async fn discard_booking(&self, id: BookingId) {
        if let Err(err) = self.bookings.delete(id).await {
            warn!(booking_id = %id, error = %err, "failed to withdraw walk-in booking");
        }
    }

    async fn reopen_booking(&self, mut booking: Booking) {
        booking.status = BookingStatus::Pending;
        if let Err(err) = self.bookings.update(&booking).await {
            warn!(booking_id = %booking.id, error = %err, "failed to reopen booking");
        }
    }

    /// Point the backing booking at the check-in's room and status.
    async fn sync_backing_booking(
        &self,
        check_in: &CheckIn,
        status: Option<BookingStatus>,
    ) -> Result<(), Error> {
        let Some(booking_id) = check_in.booking_id else {
            return Ok(());
        };
        let Some(mut booking) = self
            .bookings
            .find_by_id(booking_id)
            .await
            .map_err(map_booking_repository_error)?
        else {
            warn!(check_in_id = %check_in.id, booking_id = %booking_id, "backing booking is gone");
            return Ok(());
        };
        if booking.status != BookingStatus::CheckedIn {
            return Ok(());
        }
        booking.room_id = check_in.room_id;
        if let Some(status) = status {
            booking.status = status;
        }
        self.bookings
            .update(&booking)
            .await
            .map_err(map_booking_repository_error)
    }

    /// Occupy the room a booking reserved.
    ///
    /// The booking normally left the room Booked; a room still Available
    /// (its booking update never landed) is taken directly.
    async fn occupy_booked_room(
        &self,
        origin: IntentOrigin,
        room_id: RoomId,
    ) -> Result<SyncOutcome, Error> {
        let outcome = self
            .room_sync
            .acquire(
                origin,
                room_id,
                RoomStatus::Booked,
                RoomStatus::Occupied,
                OnRejection::Discard,
            )
            .await?;
        match outcome {
            SyncOutcome::Rejected(RoomStatusError::Conflict {
                current: RoomStatus::Available,
                ..
            }) => {
                self.room_sync
                    .acquire(
                        origin,
                        room_id,
                        RoomStatus::Available,
                        RoomStatus::Occupied,
                        OnRejection::Discard,
                    )
                    .await
            }
            other => Ok(other),
        }
    }

    async fn release(&self, check_in: &CheckIn) -> Result<(), Error> {
        let outcome = self
            .room_sync
            .release(IntentOrigin::CheckIn(check_in.id), check_in.room_id)
            .await?;
        log_follow_up(check_in.id, check_in.room_id, &outcome);
        Ok(())
    }

    async fn move_room(&self, check_in: &CheckIn, previous: RoomId) -> Result<(), Error> {
        let origin = IntentOrigin::CheckIn(check_in.id);
        let released = self.room_sync.release(origin, previous).await?;
        log_follow_up(check_in.id, previous, &released);
        let acquired = self
            .room_sync
            .acquire(
                origin,
                check_in.room_id,
                RoomStatus::Available,
                RoomStatus::Occupied,
                OnRejection::Flag,
            )
            .await?;
        log_follow_up(check_in.id, check_in.room_id, &acquired);
        Ok(())
    }
}

fn log_follow_up(check_in_id: CheckInId, room_id: RoomId, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Applied(room) => {
            info!(check_in_id = %check_in_id, room_id = %room_id, status = %room.status, "room follows check-in");
        }
        SyncOutcome::Deferred { intent_id, .. } => {
            info!(check_in_id = %check_in_id, room_id = %room_id, intent_id = %intent_id, "room update left for reconciliation");
        }
        SyncOutcome::Rejected(reason) => {
            warn!(check_in_id = %check_in_id, room_id = %room_id, error = %reason, "room update refused; intent flagged");
        }
    }
}

#[async_trait]
impl CheckInLifecycle for CheckInService {
    async fn create_check_in(&self, request: CreateCheckInRequest) -> Result<CheckInView, Error> {
        self.directories
            .require_customer(request.customer_id)
            .await?;
        self.directories
            .require_available_room(request.room_id)
            .await?;
        self.room_sync
            .ensure_no_pending_acquire(request.room_id)
            .await?;
        let check_in_date = request.check_in_date.unwrap_or_else(|| self.today());
        let expected_check_out_date = self.expected_check_out(check_in_date)?;

        let booking = self
            .bookings
            .insert(BookingDraft {
                customer_id: request.customer_id,
                room_id: request.room_id,
                booking_date: self.clock.utc(),
                check_in_date,
                status: BookingStatus::CheckedIn,
                notes: Some(WALK_IN_NOTE.to_owned()),
            })
            .await
            .map_err(map_booking_repository_error)?;
        let check_in = match self
            .check_ins
            .insert(CheckInDraft {
                booking_id: Some(booking.id),
                customer_id: request.customer_id,
                room_id: request.room_id,
                check_in_date,
                expected_check_out_date,
            })
            .await
        {
            Ok(check_in) => check_in,
            Err(err) => {
                self.discard_booking(booking.id).await;
                return Err(map_check_in_repository_error(err));
            }
        };

        let outcome = self
            .room_sync
            .acquire(
                IntentOrigin::CheckIn(check_in.id),
                check_in.room_id,
                RoomStatus::Available,
                RoomStatus::Occupied,
                OnRejection::Discard,
            )
            .await;
        let refusal = match outcome {
            Ok(SyncOutcome::Rejected(reason)) => Some(acquire_refusal(reason)),
            Err(err) => Some(err),
            Ok(_) => None,
        };
        if let Some(err) = refusal {
            self.discard_check_in(check_in.id).await;
            self.discard_booking(booking.id).await;
            info!(check_in_id = %check_in.id, error = %err, "walk-in withdrawn after room acquire failed");
            return Err(err);
        }

        info!(
            check_in_id = %check_in.id,
            booking_id = %booking.id,
            room_id = %check_in.room_id,
            "walk-in checked in"
        );
        Ok(self.view(check_in).await)
    }

    async fn create_check_in_from_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<CheckInView, Error> {
        let mut booking = self.require_booking(booking_id).await?;
        let details = json!({ "bookingId": booking_id, "status": booking.status });
        match booking.status {
            BookingStatus::Pending => {}
            BookingStatus::CheckedIn => {
                return Err(Error::already_checked_in(format!(
                    "booking {booking_id} is already checked in"
                ))
                .with_details(details));
            }
            BookingStatus::Cancelled => {
                return Err(Error::booking_cancelled(format!(
                    "booking {booking_id} was cancelled"
                ))
                .with_details(details));
            }
            BookingStatus::Completed => {
                return Err(Error::invalid_transition(format!(
                    "booking {booking_id} is already completed"
                ))
                .with_details(details));
            }
        }
        let check_in_date = self.today();
        let expected_check_out_date = self.expected_check_out(check_in_date)?;

        booking.status = BookingStatus::CheckedIn;
        self.bookings
            .update(&booking)
            .await
            .map_err(map_booking_repository_error)?;
        let check_in = match self
            .check_ins
            .insert(CheckInDraft {
                booking_id: Some(booking.id),
                customer_id: booking.customer_id,
                room_id: booking.room_id,
                check_in_date,
                expected_check_out_date,
            })
            .await
        {
            Ok(check_in) => check_in,
            Err(err) => {
                self.reopen_booking(booking).await;
                return Err(map_check_in_repository_error(err));
            }
        };

        let outcome = self
            .occupy_booked_room(IntentOrigin::CheckIn(check_in.id), check_in.room_id)
            .await;
        let refusal = match outcome {
            Ok(SyncOutcome::Rejected(reason)) => Some(acquire_refusal(reason)),
            Err(err) => Some(err),
            Ok(_) => None,
        };
        if let Some(err) = refusal {
            self.discard_check_in(check_in.id).await;
            self.reopen_booking(booking).await;
            info!(booking_id = %booking_id, error = %err, "check-in withdrawn after room acquire failed");
            return Err(err);
        }

        info!(
            check_in_id = %check_in.id,
            booking_id = %booking_id,
            room_id = %check_in.room_id,
            "booking checked in"
        );
        Ok(self.view(check_in).await)
    }

    async fn update_check_in(
        &self,
        id: CheckInId,
        request: UpdateCheckInRequest,
    ) -> Result<CheckInView, Error> {
        let mut check_in = self.require_check_in(id).await?;
        let previous_room = check_in.room_id;
        let room_changed = request.room_id != previous_room;
        if room_changed {
            if check_in.status == CheckInStatus::CheckedOut {
                return Err(Error::invalid_transition(format!(
                    "check-in {id} is checked out and cannot change rooms"
                ))
                .with_details(json!({ "checkInId": id, "status": check_in.status })));
            }
            self.directories
                .require_available_room(request.room_id)
                .await?;
            self.room_sync
                .ensure_no_pending_acquire(request.room_id)
                .await?;
        }
        if let Some(date) = request.expected_check_out_date {
            if date < check_in.check_in_date {
                return Err(Error::invalid_request(
                    "expected check-out cannot precede check-in",
                )
                .with_details(json!({ "field": "expectedCheckOutDate" })));
            }
            check_in.expected_check_out_date = date;
        }
        check_in.room_id = request.room_id;
        self.check_ins
            .update(&check_in)
            .await
            .map_err(map_check_in_repository_error)?;

        if room_changed {
            self.sync_backing_booking(&check_in, None).await?;
            self.move_room(&check_in, previous_room).await?;
            info!(check_in_id = %id, from = %previous_room, to = %check_in.room_id, "check-in moved rooms");
        }
        Ok(self.view(check_in).await)
    }

    async fn update_check_in_status(
        &self,
        id: CheckInId,
        status: CheckInStatus,
    ) -> Result<CheckInView, Error> {
        let mut check_in = self.require_check_in(id).await?;
        if check_in.status == status {
            return Ok(self.view(check_in).await);
        }
        if status == CheckInStatus::Active {
            return Err(Error::invalid_transition(format!(
                "check-in {id} is checked out and cannot be reopened"
            ))
            .with_details(json!({ "checkInId": id, "from": check_in.status, "to": status })));
        }

        self.release(&check_in).await?;
        check_in.status = CheckInStatus::CheckedOut;
        self.check_ins
            .update(&check_in)
            .await
            .map_err(map_check_in_repository_error)?;
        self.sync_backing_booking(&check_in, Some(BookingStatus::Completed))
            .await?;

        info!(check_in_id = %id, room_id = %check_in.room_id, "checked out");
        Ok(self.view(check_in).await)
    }

    async fn delete_check_in(&self, id: CheckInId) -> Result<(), Error> {
        let check_in = self.require_check_in(id).await?;
        if check_in.status == CheckInStatus::Active {
            self.release(&check_in).await?;
        }
        self.check_ins
            .delete(id)
            .await
            .map_err(map_check_in_repository_error)?;
        info!(check_in_id = %id, room_id = %check_in.room_id, "check-in deleted");
        Ok(())
    }

    async fn get_check_in(&self, id: CheckInId) -> Result<CheckInView, Error> {
        let check_in = self.require_check_in(id).await?;
        Ok(self.view(check_in).await)
    }

    async fn list_check_ins(&self, filter: CheckInFilter) -> Result<Vec<CheckInView>, Error> {
        let check_ins = self
            .check_ins
            .list(filter)
            .await
            .map_err(map_check_in_repository_error)?;
        Ok(join_all(check_ins.into_iter().map(|check_in| self.view(check_in))).await)
    }
}

#[cfg(test)]
#[path = "check_in_service_tests.rs"]
mod tests;
