//! Tests for the room status reconciler.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::TimeZone;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockRoomDirectory, MockRoomIntentStore};
use crate::domain::{
    Amount, BookingId, IntentOrigin, Room, RoomId, RoomLanes, RoomStatus, RoomStatusChange,
    RoomStatusIntentDraft,
};
use crate::outbound::memory::InMemoryRoomIntentStore;
use crate::test_support::{MutableClock, NoJitter, RecordingSleeper};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn room(status: RoomStatus) -> Room {
    Room {
        id: RoomId::new(10),
        room_number: "101".to_owned(),
        monthly_price: Amount::new(450_000),
        status,
        description: None,
    }
}

fn config() -> ReconcilerConfig {
    ReconcilerConfig {
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(1_000),
        ..ReconcilerConfig::default()
    }
}

struct Harness {
    clock: Arc<MutableClock>,
    intents: Arc<InMemoryRoomIntentStore>,
}

#[fixture]
fn harness() -> Harness {
    Harness {
        clock: Arc::new(MutableClock::new(start())),
        intents: Arc::new(InMemoryRoomIntentStore::default()),
    }
}

impl Harness {
    fn reconciler(&self, directory: MockRoomDirectory, config: ReconcilerConfig) -> Reconciler {
        Reconciler::with_runtime(
            ReconcilerPorts::new(Arc::new(directory), self.intents.clone(), RoomLanes::default()),
            self.clock.clone(),
            ReconcilerRuntime {
                sleeper: Arc::new(RecordingSleeper::default()),
                jitter: Arc::new(NoJitter),
            },
            config,
        )
    }

    async fn record_release(&self) -> RoomStatusIntent {
        self.intents
            .record(
                RoomStatusIntentDraft {
                    origin: IntentOrigin::Booking(BookingId::new(3)),
                    change: RoomStatusChange::release(RoomId::new(10)),
                },
                self.clock.utc(),
            )
            .await
            .expect("record intent")
    }

    async fn stored(&self, id: IntentId) -> Option<RoomStatusIntent> {
        self.intents.find(id).await.expect("find intent")
    }
}

#[rstest]
#[tokio::test]
async fn deferred_intent_converges_once_the_directory_recovers(harness: Harness) {
    let intent = harness.record_release().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut directory = MockRoomDirectory::new();
    directory.expect_set_status().returning(move |change| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(RoomStatusError::unavailable("connection refused"))
        } else {
            assert_eq!(change.target, RoomStatus::Available);
            Ok(room(RoomStatus::Available))
        }
    });
    let reconciler = harness.reconciler(directory, config());

    let first = reconciler.sweep().await.expect("first sweep");
    assert_eq!(first.deferred, 1);
    let pending = harness.stored(intent.id).await.expect("intent kept");
    assert_eq!(pending.attempts, 1);
    assert_eq!(pending.state, IntentState::Pending);

    harness.clock.advance(Duration::from_millis(100));
    let second = reconciler.sweep().await.expect("second sweep");

    assert_eq!(second.applied, 1);
    assert_eq!(harness.stored(intent.id).await, None);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn retry_delay_doubles_up_to_the_cap(harness: Harness) {
    let intent = harness.record_release().await;
    let mut directory = MockRoomDirectory::new();
    directory
        .expect_set_status()
        .returning(|_| Err(RoomStatusError::unavailable("connection refused")));
    let reconciler = harness.reconciler(directory, config());

    let mut delays = Vec::new();
    for _ in 0..6 {
        let before = harness.clock.utc();
        reconciler.sweep().await.expect("sweep");
        let stored = harness.stored(intent.id).await.expect("intent kept");
        let delay = stored.next_attempt_at - before;
        delays.push(delay.num_milliseconds());
        harness.clock.advance(delay.to_std().expect("positive delay"));
    }

    assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
}

#[rstest]
#[tokio::test]
async fn intents_are_not_retried_before_they_are_due(harness: Harness) {
    let intent = harness.record_release().await;
    let mut directory = MockRoomDirectory::new();
    directory
        .expect_set_status()
        .times(1)
        .returning(|_| Err(RoomStatusError::unavailable("timeout")));
    let reconciler = harness.reconciler(directory, config());

    reconciler.sweep().await.expect("first sweep");
    harness.clock.advance(Duration::from_millis(50));
    let report = reconciler.sweep().await.expect("early sweep");

    assert_eq!(report, SweepReport::default());
    assert!(harness.stored(intent.id).await.is_some());
}

#[rstest]
#[case::conflict(RoomStatusError::conflict(RoomId::new(10), RoomStatus::Maintenance))]
#[case::invalid(RoomStatusError::invalid_transition(
    RoomId::new(10),
    RoomStatus::Maintenance,
    RoomStatus::Occupied
))]
#[case::missing(RoomStatusError::not_found(RoomId::new(10)))]
#[tokio::test]
async fn refusals_are_flagged_and_left_alone(harness: Harness, #[case] refusal: RoomStatusError) {
    let intent = harness.record_release().await;
    let mut directory = MockRoomDirectory::new();
    let reply = refusal.clone();
    directory
        .expect_set_status()
        .times(1)
        .returning(move |_| Err(reply.clone()));
    let reconciler = harness.reconciler(directory, config());

    let report = reconciler.sweep().await.expect("sweep");
    harness.clock.advance(Duration::from_secs(3_600));
    let later = reconciler.sweep().await.expect("later sweep");

    assert_eq!(report.flagged, 1);
    assert_eq!(later.examined, 0);
    let flagged = harness.stored(intent.id).await.expect("intent kept");
    assert_eq!(flagged.state, IntentState::NeedsAttention);
    assert_eq!(flagged.last_error, Some(refusal.to_string()));
}

#[rstest]
#[tokio::test]
async fn attempt_ceiling_flags_the_intent(harness: Harness) {
    let intent = harness.record_release().await;
    let mut directory = MockRoomDirectory::new();
    directory
        .expect_set_status()
        .times(2)
        .returning(|_| Err(RoomStatusError::unavailable("connection refused")));
    let reconciler = harness.reconciler(
        directory,
        ReconcilerConfig {
            max_attempts: Some(2),
            ..config()
        },
    );

    let first = reconciler.sweep().await.expect("first sweep");
    harness.clock.advance(Duration::from_secs(1));
    let second = reconciler.sweep().await.expect("second sweep");

    assert_eq!(first.deferred, 1);
    assert_eq!(second.flagged, 1);
    let flagged = harness.stored(intent.id).await.expect("intent kept");
    assert_eq!(flagged.attempts, 2);
    assert_eq!(flagged.state, IntentState::NeedsAttention);
}

#[rstest]
#[tokio::test]
async fn manual_resolution_removes_the_intent(harness: Harness) {
    let intent = harness.record_release().await;
    let reconciler = harness.reconciler(MockRoomDirectory::new(), config());

    reconciler
        .resolve_intent(intent.id)
        .await
        .expect("resolve existing intent");
    let err = reconciler
        .resolve_intent(intent.id)
        .await
        .expect_err("already resolved");

    assert_eq!(err.code(), crate::domain::ErrorCode::NotFound);
    assert!(reconciler.list_intents().await.expect("list").is_empty());
}

struct StopAfterFirstSleep(watch::Sender<bool>);

#[async_trait]
impl Sleeper for StopAfterFirstSleep {
    async fn sleep(&self, _duration: Duration) {
        let _ = self.0.send(true);
    }
}

#[rstest]
#[tokio::test]
async fn run_sweeps_until_shutdown(harness: Harness) {
    let intent = harness.record_release().await;
    let mut directory = MockRoomDirectory::new();
    directory
        .expect_set_status()
        .times(1)
        .returning(|_| Ok(room(RoomStatus::Available)));
    let (sender, receiver) = watch::channel(false);
    let reconciler = Reconciler::with_runtime(
        ReconcilerPorts::new(
            Arc::new(directory),
            harness.intents.clone(),
            RoomLanes::default(),
        ),
        harness.clock.clone(),
        ReconcilerRuntime {
            sleeper: Arc::new(StopAfterFirstSleep(sender)),
            jitter: Arc::new(NoJitter),
        },
        config(),
    );

    reconciler.run(receiver).await;

    assert_eq!(harness.stored(intent.id).await, None);
}

#[rstest]
#[tokio::test]
async fn run_exits_immediately_when_already_shut_down(harness: Harness) {
    let mut directory = MockRoomDirectory::new();
    directory.expect_set_status().never();
    let reconciler = harness.reconciler(directory, config());
    let (sender, receiver) = watch::channel(true);

    reconciler.run(receiver).await;

    drop(sender);
}

#[rstest]
#[tokio::test]
async fn intents_retired_during_a_sweep_are_skipped(harness: Harness) {
    let retired = harness.record_release().await;
    let mut intents = MockRoomIntentStore::new();
    let listed = retired.clone();
    intents
        .expect_due()
        .times(1)
        .returning(move |_, _| Ok(vec![listed.clone()]));
    intents.expect_find().times(1).returning(|_| Ok(None));
    let mut directory = MockRoomDirectory::new();
    directory.expect_set_status().never();
    let reconciler = Reconciler::with_runtime(
        ReconcilerPorts::new(Arc::new(directory), Arc::new(intents), RoomLanes::default()),
        harness.clock.clone(),
        ReconcilerRuntime {
            sleeper: Arc::new(RecordingSleeper::default()),
            jitter: Arc::new(NoJitter),
        },
        config(),
    );

    let report = reconciler.sweep().await.expect("sweep");

    assert_eq!(
        report,
        SweepReport {
            examined: 1,
            ..SweepReport::default()
        }
    );
}
