//! Tests for the booking orchestrator.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    CheckInLifecycle, MockBookingRepository, MockCustomerDirectory, MockRoomDirectory,
    MockRoomIntentStore, RoomIntentStore, RoomIntentStoreError, RoomStatusError,
};
use crate::domain::{
    Amount, Customer, CustomerId, ErrorCode, ReconcilerConfig, Room, RoomLanes, StayPolicy,
};
use crate::outbound::memory::InMemoryRoomIntentStore;
use crate::test_support::MutableClock;
use crate::test_support::rig::Rentals;

const CUSTOMER: CustomerId = CustomerId::new(1);
const ROOM: RoomId = RoomId::new(10);
const OTHER_ROOM: RoomId = RoomId::new(11);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0)
        .single()
        .expect("valid instant")
}

fn arrival() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn request(room_id: RoomId) -> CreateBookingRequest {
    CreateBookingRequest {
        customer_id: CUSTOMER,
        room_id,
        check_in_date: arrival(),
        notes: Some("  late arrival ".to_owned()),
    }
}

#[fixture]
fn rentals() -> Rentals {
    let rentals = Rentals::new(now());
    rentals.seed_customer(1, "Ada Lovelace").expect("seed customer");
    rentals.seed_room(10, "101", 450_000).expect("seed room");
    rentals.seed_room(11, "102", 475_000).expect("seed room");
    rentals
}

async fn status_of(rentals: &Rentals, room_id: RoomId) -> Option<RoomStatus> {
    rentals.room_status(room_id).await.expect("room status")
}

#[rstest]
#[tokio::test]
async fn creating_a_booking_books_the_room(rentals: Rentals) {
    let view = rentals
        .booking_service()
        .create_booking(request(ROOM))
        .await
        .expect("booking created");

    assert_eq!(view.booking.status, BookingStatus::Pending);
    assert_eq!(view.booking.booking_date, now());
    assert_eq!(view.booking.notes.as_deref(), Some("late arrival"));
    assert_eq!(view.display.customer_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(view.display.room_number.as_deref(), Some("101"));
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Booked));
    assert!(rentals.intents.list().await.expect("intents").is_empty());
}

#[rstest]
#[tokio::test]
async fn a_held_room_cannot_be_booked_again(rentals: Rentals) {
    let service = rentals.booking_service();
    service.create_booking(request(ROOM)).await.expect("first booking");

    let err = service
        .create_booking(request(ROOM))
        .await
        .expect_err("room already held");

    assert_eq!(err.code(), ErrorCode::RoomAlreadyHeld);
    let stored = service
        .list_bookings(BookingFilter::Room(ROOM))
        .await
        .expect("list");
    assert_eq!(stored.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_creates_yield_one_booking(rentals: Rentals) {
    let service = rentals.booking_service();
    let first = tokio::spawn({
        let service = service.clone();
        async move { service.create_booking(request(ROOM)).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.create_booking(request(ROOM)).await }
    });

    let outcomes = [
        first.await.expect("first task"),
        second.await.expect("second task"),
    ];

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let held = outcomes
        .iter()
        .filter(|outcome| {
            outcome
                .as_ref()
                .is_err_and(|err| err.code() == ErrorCode::RoomAlreadyHeld)
        })
        .count();
    assert_eq!((successes, held), (1, 1));
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Booked));
    let stored = service
        .list_bookings(BookingFilter::All)
        .await
        .expect("list");
    assert_eq!(stored.len(), 1);
}

fn customer() -> Customer {
    Customer {
        id: CUSTOMER,
        full_name: "Ada Lovelace".to_owned(),
        phone_number: None,
        email: None,
    }
}

fn room(status: RoomStatus) -> Room {
    Room {
        id: ROOM,
        room_number: "101".to_owned(),
        monthly_price: Amount::new(450_000),
        status,
        description: None,
    }
}

#[rstest]
#[tokio::test]
async fn losing_the_compare_and_set_withdraws_the_booking() {
    let mut customers = MockCustomerDirectory::new();
    customers
        .expect_get_by_id()
        .returning(|_| Ok(Some(customer())));
    let mut rooms = MockRoomDirectory::new();
    rooms
        .expect_get_by_id()
        .returning(|_| Ok(Some(room(RoomStatus::Available))));
    rooms
        .expect_set_status()
        .times(1)
        .returning(|_| Err(RoomStatusError::conflict(ROOM, RoomStatus::Booked)));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_insert()
        .times(1)
        .returning(|draft| Ok(draft.into_booking(BookingId::new(5))));
    bookings
        .expect_delete()
        .withf(|id| *id == BookingId::new(5))
        .times(1)
        .returning(|_| Ok(true));
    let clock = Arc::new(MutableClock::new(now()));
    let rooms: Arc<dyn crate::domain::ports::RoomDirectory> = Arc::new(rooms);
    let intents = Arc::new(InMemoryRoomIntentStore::default());
    let service = BookingService::new(
        Arc::new(bookings),
        Directories::new(Arc::new(customers), rooms.clone(), Duration::from_secs(1)),
        RoomSync::new(
            rooms,
            intents.clone(),
            RoomLanes::default(),
            clock.clone(),
            Duration::from_secs(1),
        ),
        clock,
    );

    let err = service
        .create_booking(request(ROOM))
        .await
        .expect_err("lost the race");

    assert_eq!(err.code(), ErrorCode::RoomAlreadyHeld);
    assert!(intents.list().await.expect("intents").is_empty());
}

#[rstest]
#[tokio::test]
async fn a_room_update_that_cannot_be_recorded_withdraws_the_booking() {
    let mut customers = MockCustomerDirectory::new();
    customers
        .expect_get_by_id()
        .returning(|_| Ok(Some(customer())));
    let mut rooms = MockRoomDirectory::new();
    rooms
        .expect_get_by_id()
        .returning(|_| Ok(Some(room(RoomStatus::Available))));
    rooms
        .expect_set_status()
        .times(1)
        .returning(|_| Err(RoomStatusError::unavailable("connection refused")));
    let mut intents = MockRoomIntentStore::new();
    intents.expect_list().returning(|| Ok(Vec::new()));
    intents
        .expect_record()
        .times(2)
        .returning(|_, _| Err(RoomIntentStoreError::connection("store offline")));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_insert()
        .times(1)
        .returning(|draft| Ok(draft.into_booking(BookingId::new(5))));
    bookings
        .expect_delete()
        .withf(|id| *id == BookingId::new(5))
        .times(1)
        .returning(|_| Ok(true));
    let clock = Arc::new(MutableClock::new(now()));
    let rooms: Arc<dyn crate::domain::ports::RoomDirectory> = Arc::new(rooms);
    let service = BookingService::new(
        Arc::new(bookings),
        Directories::new(Arc::new(customers), rooms.clone(), Duration::from_secs(1)),
        RoomSync::new(
            rooms,
            Arc::new(intents),
            RoomLanes::default(),
            clock.clone(),
            Duration::from_secs(1),
        ),
        clock,
    );

    let err = service
        .create_booking(request(ROOM))
        .await
        .expect_err("the room update was neither delivered nor recorded");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn unreachable_directory_after_commit_defers_the_room_update(rentals: Rentals) {
    rentals.room_directory.fail_writes();

    let view = rentals
        .booking_service()
        .create_booking(request(ROOM))
        .await
        .expect("booking still succeeds");

    assert_eq!(view.booking.status, BookingStatus::Pending);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
    let intents = rentals.intents.list().await.expect("intents");
    assert_eq!(intents.len(), 1);
    assert_eq!(intents.first().map(|intent| intent.target), Some(RoomStatus::Booked));

    rentals.room_directory.restore();
    let report = rentals
        .reconciler(ReconcilerConfig::default())
        .sweep()
        .await
        .expect("sweep");

    assert_eq!(report.applied, 1);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Booked));
}

#[rstest]
#[tokio::test]
async fn precondition_outage_aborts_before_any_write(rentals: Rentals) {
    rentals.room_directory.take_offline();
    let service = rentals.booking_service();

    let err = service
        .create_booking(request(ROOM))
        .await
        .expect_err("directory down");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(service
        .list_bookings(BookingFilter::All)
        .await
        .expect("list")
        .is_empty());
    assert_eq!(rentals.room_directory.set_status_calls(), 0);
}

#[rstest]
#[tokio::test]
async fn unknown_customer_is_not_found(rentals: Rentals) {
    let err = rentals
        .booking_service()
        .create_booking(CreateBookingRequest {
            customer_id: CustomerId::new(99),
            ..request(ROOM)
        })
        .await
        .expect_err("no such customer");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
}

#[rstest]
#[tokio::test]
async fn cancelling_releases_a_booked_room(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;

    let cancelled = service
        .update_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");

    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
}

#[rstest]
#[tokio::test]
async fn cancelling_after_check_in_still_releases_the_occupied_room(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;
    rentals
        .check_in_service(StayPolicy::default())
        .create_check_in_from_booking(booking.id)
        .await
        .expect("check in");
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Occupied));

    let cancelled = service
        .update_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");

    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
}

#[rstest]
#[tokio::test]
async fn deleting_a_checked_in_booking_force_releases_the_room(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;
    let check_in = rentals
        .check_in_service(StayPolicy::default())
        .create_check_in_from_booking(booking.id)
        .await
        .expect("check in");

    service.delete_booking(booking.id).await.expect("delete");

    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
    // The active check-in survives and no longer matches its room.
    let still_active = rentals
        .check_in_service(StayPolicy::default())
        .get_check_in(check_in.check_in.id)
        .await
        .expect("check-in still exists");
    assert_eq!(still_active.check_in.status, crate::domain::CheckInStatus::Active);
}

#[rstest]
#[case::checked_in(BookingStatus::CheckedIn)]
#[case::pending_again(BookingStatus::Pending)]
#[tokio::test]
async fn disallowed_status_changes_are_invalid_transitions(
    rentals: Rentals,
    #[case] target: BookingStatus,
) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;
    service
        .update_booking_status(booking.id, BookingStatus::Completed)
        .await
        .expect("complete");

    let err = service
        .update_booking_status(booking.id, target)
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn checked_in_is_refused_from_pending(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;

    let err = service
        .update_booking_status(booking.id, BookingStatus::CheckedIn)
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Booked));
}

#[rstest]
#[tokio::test]
async fn reapplying_the_current_status_touches_nothing(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;
    service
        .update_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");
    let calls = rentals.room_directory.set_status_calls();

    let again = service
        .update_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .expect("no-op");

    assert_eq!(again.booking.status, BookingStatus::Cancelled);
    assert_eq!(rentals.room_directory.set_status_calls(), calls);
}

#[rstest]
#[tokio::test]
async fn moving_rooms_releases_the_old_and_books_the_new(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;

    let moved = service
        .update_booking(
            booking.id,
            UpdateBookingRequest {
                room_id: OTHER_ROOM,
                check_in_date: arrival(),
                notes: None,
            },
        )
        .await
        .expect("move");

    assert_eq!(moved.booking.room_id, OTHER_ROOM);
    assert_eq!(moved.display.room_number.as_deref(), Some("102"));
    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
    assert_eq!(status_of(&rentals, OTHER_ROOM).await, Some(RoomStatus::Booked));
}

#[rstest]
#[tokio::test]
async fn closed_bookings_cannot_move_rooms(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;
    service
        .update_booking_status(booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");

    let err = service
        .update_booking(
            booking.id,
            UpdateBookingRequest {
                room_id: OTHER_ROOM,
                check_in_date: arrival(),
                notes: None,
            },
        )
        .await
        .expect_err("closed booking");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert_eq!(status_of(&rentals, OTHER_ROOM).await, Some(RoomStatus::Available));
}

#[rstest]
#[tokio::test]
async fn deleting_a_pending_booking_frees_the_room(rentals: Rentals) {
    let service = rentals.booking_service();
    let booking = service.create_booking(request(ROOM)).await.expect("booking").booking;

    service.delete_booking(booking.id).await.expect("delete");

    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Available));
    let err = service.get_booking(booking.id).await.expect_err("gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_a_cancelled_booking_leaves_the_next_holder_alone(rentals: Rentals) {
    rentals.seed_customer(2, "Grace Hopper").expect("seed customer");
    let service = rentals.booking_service();
    let cancelled = service.create_booking(request(ROOM)).await.expect("booking").booking;
    service
        .update_booking_status(cancelled.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");
    service
        .create_booking(CreateBookingRequest {
            customer_id: CustomerId::new(2),
            ..request(ROOM)
        })
        .await
        .expect("next holder");

    service.delete_booking(cancelled.id).await.expect("delete");

    assert_eq!(status_of(&rentals, ROOM).await, Some(RoomStatus::Booked));
    assert!(rentals.intents.list().await.expect("intents").is_empty());
}

#[rstest]
#[tokio::test]
async fn search_matches_customer_or_booking_id(rentals: Rentals) {
    rentals.seed_customer(2, "Grace Hopper").expect("seed customer");
    let service = rentals.booking_service();
    let first = service.create_booking(request(ROOM)).await.expect("booking").booking;
    let second = service
        .create_booking(CreateBookingRequest {
            customer_id: CustomerId::new(2),
            ..request(OTHER_ROOM)
        })
        .await
        .expect("booking")
        .booking;

    let by_customer = service
        .list_bookings(BookingFilter::Search {
            customer_id: Some(CUSTOMER),
            booking_id: None,
        })
        .await
        .expect("search");
    let by_id = service
        .list_bookings(BookingFilter::Search {
            customer_id: None,
            booking_id: Some(second.id),
        })
        .await
        .expect("search");

    assert_eq!(
        by_customer.iter().map(|view| view.booking.id).collect::<Vec<_>>(),
        vec![first.id]
    );
    assert_eq!(
        by_id.iter().map(|view| view.booking.id).collect::<Vec<_>>(),
        vec![second.id]
    );
}
