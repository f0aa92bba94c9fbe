//! In-memory booking repository.

use async_trait::async_trait;

use super::{Table, TableState};
use crate::domain::ports::{BookingFilter, BookingRepository, BookingRepositoryError};
use crate::domain::{Booking, BookingDraft, BookingId, RoomId};

/// Booking store owned by the booking orchestrator.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    table: Table<Booking>,
}

/// At most one live booking per room, checked under the table lock.
fn ensure_room_free(
    state: &TableState<Booking>,
    room_id: RoomId,
    except: Option<BookingId>,
) -> Result<(), BookingRepositoryError> {
    let holder = state.rows.values().find(|booking| {
        booking.room_id == room_id && booking.status.holds_room() && Some(booking.id) != except
    });
    match holder {
        Some(booking) => Err(BookingRepositoryError::room_held(room_id, booking.id)),
        None => Ok(()),
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, draft: BookingDraft) -> Result<Booking, BookingRepositoryError> {
        let mut state = self.table.lock(BookingRepositoryError::connection)?;
        if draft.status.holds_room() {
            ensure_room_free(&state, draft.room_id, None)?;
        }
        let id = state.allocate();
        let booking = draft.into_booking(BookingId::new(id));
        state.rows.insert(id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let state = self.table.lock(BookingRepositoryError::connection)?;
        Ok(state.rows.get(&id.get()).cloned())
    }

    async fn update(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut state = self.table.lock(BookingRepositoryError::connection)?;
        if booking.status.holds_room() {
            ensure_room_free(&state, booking.room_id, Some(booking.id))?;
        }
        let slot = state
            .rows
            .get_mut(&booking.id.get())
            .ok_or_else(|| BookingRepositoryError::missing(booking.id))?;
        *slot = booking.clone();
        Ok(())
    }

    async fn delete(&self, id: BookingId) -> Result<bool, BookingRepositoryError> {
        let mut state = self.table.lock(BookingRepositoryError::connection)?;
        Ok(state.rows.remove(&id.get()).is_some())
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.table.lock(BookingRepositoryError::connection)?;
        Ok(state
            .rows
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect())
    }
}
