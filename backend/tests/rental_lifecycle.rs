//! End-to-end rental flows over the in-memory deployment.
//!
//! Each test drives the orchestrators exactly as the HTTP layer would and
//! checks the room directory afterwards, so the cross-service effects of a
//! booking, check-in or reconciliation are visible in one place.

use std::time::Duration;

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use ::rentals::domain::ports::{
    BookingFilter, BookingLifecycle, CheckInLifecycle, CreateBookingRequest,
    CreateCheckInRequest, ReconciliationControl, RoomAdministration,
};
use ::rentals::domain::{
    BookingStatus, CheckInStatus, CustomerId, ErrorCode, IntentState, ReconcilerConfig,
    RoomId, RoomStatus, RoomStatusChange, StayPolicy,
};
use ::rentals::test_support::rig::Rentals;
use rstest::{fixture, rstest};

const ROOM: RoomId = RoomId::new(10);
const CUSTOMER: CustomerId = CustomerId::new(1);

#[fixture]
fn rentals() -> Rentals {
    let now = Utc
        .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid instant");
    let rentals = Rentals::new(now);
    rentals.seed_customer(1, "Ada Lovelace").expect("seed customer");
    rentals.seed_room(10, "101", 450_000).expect("seed room");
    rentals
}

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn booking_request() -> CreateBookingRequest {
    CreateBookingRequest {
        customer_id: CUSTOMER,
        room_id: ROOM,
        check_in_date: june_first(),
        notes: None,
    }
}

async fn room_status(rentals: &Rentals) -> Option<RoomStatus> {
    rentals.room_status(ROOM).await.expect("room status")
}

#[rstest]
#[tokio::test]
async fn booking_check_in_and_check_out_move_the_room_through_its_states(rentals: Rentals) {
    let bookings = rentals.booking_service();
    let check_ins = rentals.check_in_service(StayPolicy::default());

    let booking = bookings
        .create_booking(booking_request())
        .await
        .expect("booking");
    assert_eq!(booking.booking.status, BookingStatus::Pending);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Booked));

    let check_in = check_ins
        .create_check_in_from_booking(booking.booking.id)
        .await
        .expect("check-in");
    assert_eq!(check_in.check_in.status, CheckInStatus::Active);
    assert_eq!(
        check_in.check_in.expected_check_out_date,
        NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date")
    );
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Occupied));

    let checked_out = check_ins
        .update_check_in_status(check_in.check_in.id, CheckInStatus::CheckedOut)
        .await
        .expect("check-out");
    assert_eq!(checked_out.check_in.status, CheckInStatus::CheckedOut);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Available));

    let completed = bookings
        .get_booking(booking.booking.id)
        .await
        .expect("booking after check-out");
    assert_eq!(completed.booking.status, BookingStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn reapplying_a_room_status_is_a_no_op(rentals: Rentals) {
    let admin = rentals.room_admin();
    let change = RoomStatusChange {
        room_id: ROOM,
        expected: Some(RoomStatus::Available),
        target: RoomStatus::Booked,
    };

    let first = admin.change_status(change).await.expect("first change");
    let retried = admin.change_status(change).await.expect("retried change");

    assert_eq!(first, retried);
    assert_eq!(retried.status, RoomStatus::Booked);
}

#[rstest]
#[tokio::test]
async fn concurrent_bookings_for_one_room_admit_exactly_one(rentals: Rentals) {
    rentals.seed_customer(2, "Grace Hopper").expect("seed customer");
    let bookings = rentals.booking_service();
    let rival = CreateBookingRequest {
        customer_id: CustomerId::new(2),
        ..booking_request()
    };

    let (first, second) = tokio::join!(
        bookings.create_booking(booking_request()),
        bookings.create_booking(rival)
    );

    let outcomes = [first, second];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let losers: Vec<ErrorCode> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err().map(|err| err.code()))
        .collect();
    assert_eq!(winners, 1);
    assert_eq!(losers, vec![ErrorCode::RoomAlreadyHeld]);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Booked));
}

#[rstest]
#[tokio::test]
async fn a_lost_release_converges_once_the_directory_recovers(rentals: Rentals) {
    let bookings = rentals.booking_service();
    let reconciler = rentals.reconciler(ReconcilerConfig {
        initial_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(60),
        ..ReconcilerConfig::default()
    });
    let booking = bookings
        .create_booking(booking_request())
        .await
        .expect("booking");

    rentals.room_directory.fail_writes();
    let cancelled = bookings
        .update_booking_status(booking.booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancellation succeeds while the directory is down");
    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Booked));

    let still_down = reconciler.sweep().await.expect("sweep");
    assert_eq!(still_down.deferred, 1);
    let backing_off = reconciler.sweep().await.expect("sweep");
    assert_eq!(backing_off.examined, 0);

    rentals.clock.advance(Duration::from_secs(2));
    let still_down = reconciler.sweep().await.expect("sweep");
    assert_eq!(still_down.deferred, 1);
    let intents = reconciler.list_intents().await.expect("intents");
    assert_eq!(intents.len(), 1);
    assert_eq!(
        intents.first().map(|intent| intent.next_attempt_at - rentals.clock.utc()),
        Some(TimeDelta::seconds(4))
    );

    rentals.room_directory.restore();
    rentals.clock.advance(Duration::from_secs(4));
    let recovered = reconciler.sweep().await.expect("sweep");

    assert_eq!(recovered.applied, 1);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Available));
    assert!(reconciler.list_intents().await.expect("intents").is_empty());
}

#[rstest]
#[tokio::test]
async fn an_intent_overtaken_by_an_operator_is_flagged(rentals: Rentals) {
    let bookings = rentals.booking_service();
    let check_ins = rentals.check_in_service(StayPolicy::default());
    let reconciler = rentals.reconciler(ReconcilerConfig::default());
    let booking = bookings
        .create_booking(booking_request())
        .await
        .expect("booking");
    rentals.room_directory.fail_writes();
    check_ins
        .create_check_in_from_booking(booking.booking.id)
        .await
        .expect("check-in succeeds while the directory is down");

    let admin = rentals.room_admin();
    admin
        .change_status(RoomStatusChange {
            room_id: ROOM,
            expected: Some(RoomStatus::Booked),
            target: RoomStatus::Available,
        })
        .await
        .expect("operator release");
    admin.start_maintenance(ROOM).await.expect("maintenance");
    rentals.room_directory.restore();

    let report = reconciler.sweep().await.expect("sweep");

    assert_eq!(report.flagged, 1);
    let intents = reconciler.list_intents().await.expect("intents");
    assert_eq!(
        intents.iter().map(|intent| intent.state).collect::<Vec<_>>(),
        vec![IntentState::NeedsAttention]
    );
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Maintenance));
}

#[rstest]
#[tokio::test]
async fn a_cancellation_overrides_an_undelivered_acquire(rentals: Rentals) {
    let bookings = rentals.booking_service();
    let reconciler = rentals.reconciler(ReconcilerConfig::default());
    rentals.room_directory.fail_writes();
    let booking = bookings
        .create_booking(booking_request())
        .await
        .expect("booking succeeds while the directory is down");
    rentals.room_directory.restore();

    let cancelled = bookings
        .update_booking_status(booking.booking.id, BookingStatus::Cancelled)
        .await
        .expect("cancel");
    let report = reconciler.sweep().await.expect("sweep");

    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert_eq!(report.applied, 0);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Available));
    assert!(reconciler.list_intents().await.expect("intents").is_empty());
}

#[rstest]
#[tokio::test]
async fn a_room_with_an_undelivered_booking_is_not_booked_twice(rentals: Rentals) {
    rentals.seed_customer(2, "Grace Hopper").expect("seed customer");
    let bookings = rentals.booking_service();
    let check_ins = rentals.check_in_service(StayPolicy::default());
    let reconciler = rentals.reconciler(ReconcilerConfig::default());
    rentals.room_directory.fail_writes();
    let first = bookings
        .create_booking(booking_request())
        .await
        .expect("booking succeeds while the directory is down");
    rentals.room_directory.restore();

    let rival = bookings
        .create_booking(CreateBookingRequest {
            customer_id: CustomerId::new(2),
            ..booking_request()
        })
        .await
        .expect_err("the room is already held");
    let walk_in = check_ins
        .create_check_in(CreateCheckInRequest {
            customer_id: CustomerId::new(2),
            room_id: ROOM,
            check_in_date: None,
        })
        .await
        .expect_err("the room is already held");
    let report = reconciler.sweep().await.expect("sweep");

    assert_eq!(rival.code(), ErrorCode::RoomAlreadyHeld);
    assert_eq!(walk_in.code(), ErrorCode::RoomAlreadyHeld);
    let held: Vec<_> = bookings
        .list_bookings(BookingFilter::Room(ROOM))
        .await
        .expect("bookings")
        .into_iter()
        .map(|view| view.booking.id)
        .collect();
    assert_eq!(held, vec![first.booking.id]);
    assert_eq!(report.applied, 1);
    assert_eq!(room_status(&rentals).await, Some(RoomStatus::Booked));
}
