//! Integration tests for the reservation coordinator against the real
//! in-memory broadcaster.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::future::join_all;
use tokio::sync::Barrier;

use parking_core::config::ReservationConfig;
use parking_core::error::ErrorKind;
use parking_core::events::{Notification, SlotAction};
use parking_core::result::AppResult;
use parking_core::traits::{Broadcaster, SlotAvailability, SlotDirectory};
use parking_core::types::id::{SlotId, SpaceId, UserId};
use parking_core::types::topic::Topic;
use parking_reservation::booking::MemoryBookingStore;
use parking_reservation::coordinator::{
    BookRequest, ReleaseRequest, ReservationCoordinator, ReserveRequest,
};
use parking_reservation::directory::MemorySlotDirectory;

use helpers::{
    BrokenBroadcaster, FlakyDirectory, Harness, OTHER_SPACE, SPACE, SlowAggregateBroadcaster,
    drain, inventory, reserve_request,
};

const MINUTE: Duration = Duration::from_secs(60);

fn actions(notifications: &[Notification]) -> Vec<SlotAction> {
    notifications.iter().map(Notification::action).collect()
}

fn release_request(slot: i64, user: Option<i64>) -> ReleaseRequest {
    ReleaseRequest {
        slot_id: SlotId(slot),
        space_id: SPACE,
        user_id: user.map(UserId),
    }
}

fn book_request(slot: i64, user: i64) -> BookRequest {
    BookRequest {
        slot_id: SlotId(slot),
        space_id: SPACE,
        user_id: UserId(user),
    }
}

#[tokio::test]
async fn test_reserve_publishes_to_every_topic() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;
    let mut space = h.subscribe(Topic::Space(SPACE)).await;
    let mut aggregate = h.subscribe(Topic::SpaceAggregate(SPACE)).await;

    let initial = space.next().await.expect("initial status");
    let initial = initial.as_space().expect("space summary");
    assert_eq!(initial.action, SlotAction::InitialStatus);
    assert_eq!((initial.available_slots, initial.total_slots), (10, 10));

    let reservation = h
        .coordinator
        .reserve(reserve_request(1, 7, 5 * MINUTE))
        .await
        .expect("reserve");
    assert_eq!(reservation.user_id, UserId(7));
    assert_eq!(reservation.space_id, SPACE);

    let event = all.next().await.expect("all-slots event");
    let event = event.as_slot().expect("slot event");
    assert_eq!(event.action, SlotAction::Reserved);
    assert_eq!(event.slot_id, SlotId(1));
    assert!(!event.available);
    assert_eq!(event.user_id, Some(UserId(7)));
    assert_eq!(event.user_name.as_deref(), Some("user-7"));

    let on_space = space.next().await.expect("space event");
    assert_eq!(on_space.action(), SlotAction::Reserved);

    let update = aggregate.next().await.expect("aggregate update");
    let update = update.as_space().expect("space summary");
    assert_eq!(update.action, SlotAction::AvailabilityUpdate);
    assert_eq!((update.available_slots, update.total_slots), (9, 10));
}

#[tokio::test]
async fn test_second_reserve_is_rejected_without_side_effects() {
    let h = Harness::new();
    h.coordinator
        .reserve(reserve_request(3, 1, 5 * MINUTE))
        .await
        .expect("first reserve");

    let mut all = h.subscribe(Topic::AllSlots).await;
    let err = h
        .coordinator
        .reserve(reserve_request(3, 2, 5 * MINUTE))
        .await
        .expect_err("slot already held");

    assert_eq!(err.kind, ErrorKind::AlreadyReserved);
    assert_eq!(
        h.coordinator.reservation(SlotId(3)).map(|r| r.user_id),
        Some(UserId(1))
    );
    assert!(drain(&mut all).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserves_have_exactly_one_winner() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;
    let contenders = 32;

    for slot in 1..=10 {
        let barrier = Arc::new(Barrier::new(contenders));
        let tasks = (0..contenders as i64).map(|user| {
            let coordinator = h.coordinator.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator
                    .reserve(reserve_request(slot, user, 5 * MINUTE))
                    .await
            })
        });

        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.expect("task panicked"))
            .collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "slot {slot} must have one holder");
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| e.kind == ErrorKind::AlreadyReserved)
        );

        let reserved: Vec<_> = drain(&mut all)
            .into_iter()
            .filter_map(|n| n.as_slot().cloned())
            .filter(|e| e.action == SlotAction::Reserved)
            .collect();
        assert_eq!(reserved.len(), 1, "slot {slot} must publish one RESERVED");
        assert_eq!(reserved[0].user_id, Some(winners[0].user_id));
    }

    assert_eq!(h.coordinator.active_count(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_hold_times_out_and_slot_becomes_reservable() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    h.coordinator
        .reserve(reserve_request(2, 1, MINUTE))
        .await
        .expect("reserve");
    assert_eq!(all.next().await.map(|n| n.action()), Some(SlotAction::Reserved));

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert!(h.coordinator.reservation(SlotId(2)).is_some());

    let timeout = all.next().await.expect("timeout event");
    let timeout = timeout.as_slot().expect("slot event");
    assert_eq!(timeout.action, SlotAction::Timeout);
    assert!(timeout.available);
    assert_eq!(timeout.user_id, None);

    assert!(h.coordinator.reservation(SlotId(2)).is_none());
    assert_eq!(h.coordinator.pending_timers(), 0);

    h.coordinator
        .reserve(reserve_request(2, 2, MINUTE))
        .await
        .expect("slot reservable again");
}

#[tokio::test(start_paused = true)]
async fn test_release_cancels_timeout() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    h.coordinator
        .reserve(reserve_request(4, 1, MINUTE))
        .await
        .expect("reserve");
    let released = h
        .coordinator
        .release(release_request(4, Some(1)))
        .await
        .expect("release");
    assert_eq!(released.user_id, UserId(1));
    assert_eq!(h.coordinator.pending_timers(), 0);

    tokio::time::sleep(2 * MINUTE).await;

    assert_eq!(
        actions(&drain(&mut all)),
        vec![SlotAction::Reserved, SlotAction::Released]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_expiry_never_touches_a_newer_hold() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    h.coordinator
        .reserve(reserve_request(6, 1, MINUTE))
        .await
        .expect("first hold");
    h.coordinator
        .release(release_request(6, None))
        .await
        .expect("release");
    h.coordinator
        .reserve(reserve_request(6, 2, 5 * MINUTE))
        .await
        .expect("second hold");

    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;

    assert_eq!(
        h.coordinator.reservation(SlotId(6)).map(|r| r.user_id),
        Some(UserId(2))
    );
    assert!(!actions(&drain(&mut all)).contains(&SlotAction::Timeout));
}

#[tokio::test]
async fn test_release_rejections() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    let err = h
        .coordinator
        .release(release_request(5, None))
        .await
        .expect_err("nothing held");
    assert_eq!(err.kind, ErrorKind::NotReserved);

    h.coordinator
        .reserve(reserve_request(5, 1, 5 * MINUTE))
        .await
        .expect("reserve");

    let err = h
        .coordinator
        .release(release_request(5, Some(2)))
        .await
        .expect_err("held by someone else");
    assert_eq!(err.kind, ErrorKind::NotReserved);
    assert!(h.coordinator.reservation(SlotId(5)).is_some());

    h.coordinator
        .release(release_request(5, Some(1)))
        .await
        .expect("owner releases");
    let err = h
        .coordinator
        .release(release_request(5, Some(1)))
        .await
        .expect_err("double release");
    assert_eq!(err.kind, ErrorKind::NotReserved);

    assert_eq!(
        actions(&drain(&mut all)),
        vec![SlotAction::Reserved, SlotAction::Released],
        "exactly one RELEASED for the double release"
    );
}

#[tokio::test(start_paused = true)]
async fn test_book_finalizes_the_slot() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    h.coordinator
        .reserve(reserve_request(7, 3, MINUTE))
        .await
        .expect("reserve");
    let confirmation = h
        .coordinator
        .book(book_request(7, 3))
        .await
        .expect("book");

    assert_eq!(confirmation.slot_id, SlotId(7));
    assert_eq!(confirmation.space_id, SPACE);
    assert!(h.bookings.get(&confirmation.booking_ref).is_some());
    assert!(h.coordinator.reservation(SlotId(7)).is_none());
    assert!(!h.directory.is_available(SlotId(7)).await.expect("lookup"));

    let err = h
        .coordinator
        .reserve(reserve_request(7, 4, MINUTE))
        .await
        .expect_err("booked slot");
    assert_eq!(err.kind, ErrorKind::SlotUnavailable);

    tokio::time::sleep(2 * MINUTE).await;

    let events = drain(&mut all);
    assert_eq!(actions(&events), vec![SlotAction::Reserved, SlotAction::Booked]);
    let booked = events[1].as_slot().expect("slot event");
    assert!(!booked.available);
    assert_eq!(booked.user_id, Some(UserId(3)));
}

fn counts(notifications: &[Notification]) -> Vec<(u32, u32)> {
    notifications
        .iter()
        .filter_map(Notification::as_space)
        .map(|summary| (summary.available_slots, summary.total_slots))
        .collect()
}

#[tokio::test]
async fn test_aggregate_counts_holds_and_bookings() {
    let h = Harness::new();
    let mut aggregate = h.subscribe(Topic::SpaceAggregate(SPACE)).await;

    h.coordinator
        .reserve(reserve_request(1, 1, 5 * MINUTE))
        .await
        .expect("reserve 1");
    h.coordinator
        .reserve(reserve_request(2, 2, 5 * MINUTE))
        .await
        .expect("reserve 2");
    h.coordinator
        .book(book_request(3, 3))
        .await
        .expect("book 3");

    let updates = drain(&mut aggregate);
    assert!(
        updates
            .iter()
            .all(|n| n.action() == SlotAction::AvailabilityUpdate)
    );
    assert_eq!(counts(&updates), vec![(9, 10), (8, 10), (7, 10)]);

    // Rejections publish nothing.
    h.coordinator
        .reserve(reserve_request(1, 9, MINUTE))
        .await
        .expect_err("slot 1 held");
    h.coordinator
        .release(release_request(4, None))
        .await
        .expect_err("slot 4 free");
    assert!(drain(&mut aggregate).is_empty());

    let mut fresh = h.subscribe(Topic::Space(SPACE)).await;
    let initial = fresh.next().await.expect("initial status");
    assert_eq!(initial.action(), SlotAction::InitialStatus);
    assert_eq!(counts(&[initial]), vec![(7, 10)]);

    // Swapping one hold for another settles back at 7/10.
    h.coordinator
        .release(release_request(1, Some(1)))
        .await
        .expect("release 1");
    h.coordinator
        .reserve(reserve_request(4, 4, 5 * MINUTE))
        .await
        .expect("reserve 4");
    assert_eq!(counts(&drain(&mut aggregate)), vec![(8, 10), (7, 10)]);

    let summary = h
        .coordinator
        .space_summary(SPACE, SlotAction::AvailabilityUpdate)
        .await
        .expect("summary");
    assert_eq!((summary.available_slots, summary.total_slots), (7, 10));

    let other = h
        .coordinator
        .initial_status(OTHER_SPACE)
        .await
        .expect("other space");
    assert_eq!(other.action, SlotAction::InitialStatus);
    assert_eq!((other.available_slots, other.total_slots), (3, 4));
}

#[tokio::test(start_paused = true)]
async fn test_last_aggregate_matches_state_when_publish_is_slow() {
    let h = Harness::with_broadcaster(|inner| -> Arc<dyn Broadcaster> {
        Arc::new(SlowAggregateBroadcaster::new(
            inner,
            Duration::from_millis(200),
        ))
    });
    let mut aggregate = h.subscribe(Topic::SpaceAggregate(SPACE)).await;

    let first = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.reserve(reserve_request(1, 1, MINUTE)).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.coordinator
        .reserve(reserve_request(2, 2, MINUTE))
        .await
        .expect("reserve 2");
    first.await.expect("join").expect("reserve 1");

    let published = counts(&drain(&mut aggregate));
    let current = h
        .coordinator
        .space_summary(SPACE, SlotAction::AvailabilityUpdate)
        .await
        .expect("summary");

    assert_eq!(
        published.last().copied(),
        Some((current.available_slots, current.total_slots))
    );
    assert_eq!(published, vec![(9, 10), (8, 10)]);
}

#[tokio::test]
async fn test_directory_write_failure_keeps_hold() {
    let memory = Arc::new(MemorySlotDirectory::from_inventory(&inventory()));
    let flaky = Arc::new(FlakyDirectory::new(Arc::clone(&memory)));
    let h = Harness::with_directory(memory, flaky.clone());

    h.coordinator
        .reserve(reserve_request(8, 1, 5 * MINUTE))
        .await
        .expect("reserve");
    let mut all = h.subscribe(Topic::AllSlots).await;
    flaky.fail_writes.store(true, Ordering::SeqCst);

    let err = h
        .coordinator
        .book(book_request(8, 1))
        .await
        .expect_err("directory rejects write");

    assert_eq!(err.kind, ErrorKind::DirectoryWriteFailed);
    assert!(h.coordinator.reservation(SlotId(8)).is_some());
    assert!(h.bookings.is_empty(), "booking must be compensated");
    assert!(h.directory.is_available(SlotId(8)).await.expect("lookup"));
    assert!(drain(&mut all).is_empty());
}

#[tokio::test]
async fn test_directory_lookup_failure_fails_closed() {
    let memory = Arc::new(MemorySlotDirectory::from_inventory(&inventory()));
    let flaky = Arc::new(FlakyDirectory::new(Arc::clone(&memory)));
    let h = Harness::with_directory(memory, flaky.clone());
    flaky.fail_lookups.store(true, Ordering::SeqCst);

    let err = h
        .coordinator
        .reserve(reserve_request(1, 1, MINUTE))
        .await
        .expect_err("lookup failure");
    assert_eq!(err.kind, ErrorKind::SlotUnavailable);
    assert_eq!(h.coordinator.active_count(), 0);
}

#[tokio::test]
async fn test_unknown_slot_is_unavailable() {
    let h = Harness::new();
    let err = h
        .coordinator
        .reserve(reserve_request(999, 1, MINUTE))
        .await
        .expect_err("unknown slot");
    assert_eq!(err.kind, ErrorKind::SlotUnavailable);
}

#[tokio::test]
async fn test_broadcast_failure_does_not_undo_transitions() {
    let directory = Arc::new(MemorySlotDirectory::from_inventory(&inventory()));
    let coordinator = ReservationCoordinator::new(
        &ReservationConfig::default(),
        directory,
        Arc::new(MemoryBookingStore::new()),
        Arc::new(BrokenBroadcaster),
    );
    coordinator.start().expect("start");

    coordinator
        .reserve(reserve_request(1, 1, MINUTE))
        .await
        .expect("reserve despite broadcast failure");
    assert!(coordinator.reservation(SlotId(1)).is_some());

    coordinator
        .release(release_request(1, Some(1)))
        .await
        .expect("release despite broadcast failure");
    coordinator
        .book(book_request(2, 1))
        .await
        .expect("book despite broadcast failure");

    assert!(coordinator.subscribe(Topic::AllSlots).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_holds_and_timers() {
    let h = Harness::new();
    let mut all = h.subscribe(Topic::AllSlots).await;

    for slot in [1, 2] {
        h.coordinator
            .reserve(reserve_request(slot, slot, MINUTE))
            .await
            .expect("reserve");
    }

    h.coordinator.stop();

    assert!(!h.coordinator.is_running());
    assert_eq!(h.coordinator.active_count(), 0);
    assert_eq!(h.coordinator.pending_timers(), 0);

    let err = h
        .coordinator
        .reserve(reserve_request(3, 3, MINUTE))
        .await
        .expect_err("stopped");
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    tokio::time::sleep(2 * MINUTE).await;
    assert_eq!(
        actions(&drain(&mut all)),
        vec![SlotAction::Reserved, SlotAction::Reserved]
    );
    assert!(h.coordinator.start().is_err(), "stopped coordinator stays stopped");
}

#[tokio::test]
async fn test_subscribing_to_unknown_space_has_no_initial_status() {
    let h = Harness::new();
    let mut stream = h.subscribe(Topic::Space(SpaceId(99))).await;
    assert!(drain(&mut stream).is_empty());
}

#[tokio::test]
async fn test_missing_ttl_uses_configured_default() {
    let h = Harness::new();
    let reservation = h
        .coordinator
        .reserve(ReserveRequest {
            ttl: None,
            ..reserve_request(9, 1, MINUTE)
        })
        .await
        .expect("reserve");
    assert_eq!(reservation.ttl, h.coordinator.default_ttl());
    assert_eq!(reservation.ttl, 5 * MINUTE);
}

#[tokio::test]
async fn test_rejected_operations_leave_no_slot_locks() {
    let h = Harness::new();

    for slot in 1_000..2_000 {
        let err = h
            .coordinator
            .reserve(reserve_request(slot, 1, MINUTE))
            .await
            .expect_err("unknown slot");
        assert_eq!(err.kind, ErrorKind::SlotUnavailable);
        h.coordinator
            .release(release_request(slot, None))
            .await
            .expect_err("nothing held");
    }
    assert_eq!(h.coordinator.locked_slots(), 0);

    h.coordinator
        .reserve(reserve_request(1, 1, MINUTE))
        .await
        .expect("reserve");
    h.coordinator
        .release(release_request(1, None))
        .await
        .expect("release");
    assert_eq!(h.coordinator.locked_slots(), 0);
}

/// Directory that stops the coordinator while a lookup is in flight.
struct StopDuringLookup {
    inner: MemorySlotDirectory,
    coordinator: OnceLock<ReservationCoordinator>,
}

#[async_trait]
impl SlotDirectory for StopDuringLookup {
    async fn slot(&self, slot_id: SlotId) -> AppResult<Option<SlotAvailability>> {
        if let Some(coordinator) = self.coordinator.get() {
            coordinator.stop();
        }
        self.inner.slot(slot_id).await
    }

    async fn mark_unavailable(&self, slot_id: SlotId) -> AppResult<()> {
        self.inner.mark_unavailable(slot_id).await
    }

    async fn list_slots(&self, space_id: SpaceId) -> AppResult<Vec<SlotAvailability>> {
        self.inner.list_slots(space_id).await
    }
}

#[tokio::test]
async fn test_reserve_racing_stop_leaves_no_hold() {
    let directory = Arc::new(StopDuringLookup {
        inner: MemorySlotDirectory::from_inventory(&inventory()),
        coordinator: OnceLock::new(),
    });
    let coordinator = ReservationCoordinator::new(
        &ReservationConfig::default(),
        directory.clone(),
        Arc::new(MemoryBookingStore::new()),
        Arc::new(BrokenBroadcaster),
    );
    coordinator.start().expect("start");
    directory
        .coordinator
        .set(coordinator.clone())
        .expect("set once");

    let err = coordinator
        .reserve(reserve_request(1, 1, MINUTE))
        .await
        .expect_err("stopped mid-reserve");
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(coordinator.reservation(SlotId(1)).is_none());
    assert_eq!(coordinator.active_count(), 0);
    assert_eq!(coordinator.pending_timers(), 0);
}
