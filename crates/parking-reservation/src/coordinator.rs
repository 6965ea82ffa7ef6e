//! The reservation coordinator: the single authority over slot holds.
//!
//! Every reserve/release/book/timeout transition runs under a per-slot async
//! lock, so operations on one slot serialize and publish their events in
//! transition order, while operations on different slots never contend.
//! Aggregate summaries are computed and published under a per-space lock,
//! always taken after the slot lock.
//! Directory and broadcaster calls are never made while a store shard is
//! locked; the store's own operations are atomic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use parking_core::config::ReservationConfig;
use parking_core::error::{AppError, ErrorKind};
use parking_core::events::{Notification, NotificationEvent, SlotAction, SpaceAvailabilitySummary};
use parking_core::result::AppResult;
use parking_core::traits::{BookingStore, Broadcaster, NotificationStream, SlotDirectory};
use parking_core::types::id::{BookingRef, SlotId, SpaceId, UserId};
use parking_core::types::topic::Topic;

use crate::locks::KeyedLocks;
use crate::scheduler::ExpiryScheduler;
use crate::store::{Holder, Reservation, ReservationStore};

/// Input to [`ReservationCoordinator::reserve`].
#[derive(Debug, Clone)]
pub struct ReserveRequest {
    /// Slot to hold.
    pub slot_id: SlotId,
    /// Space the caller believes the slot belongs to.
    pub space_id: SpaceId,
    /// Requesting user.
    pub user_id: UserId,
    /// Requesting user's display name.
    pub user_name: String,
    /// Hold duration; `None` uses the configured default.
    pub ttl: Option<Duration>,
}

/// Input to [`ReservationCoordinator::release`].
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    /// Slot to release.
    pub slot_id: SlotId,
    /// Space the caller believes the slot belongs to.
    pub space_id: SpaceId,
    /// When set, only a hold owned by this user is released.
    pub user_id: Option<UserId>,
}

/// Input to [`ReservationCoordinator::book`].
#[derive(Debug, Clone)]
pub struct BookRequest {
    /// Slot to book.
    pub slot_id: SlotId,
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// Booking user.
    pub user_id: UserId,
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    /// Reference from the booking store.
    pub booking_ref: BookingRef,
    /// Booked slot.
    pub slot_id: SlotId,
    /// Space the booked slot belongs to.
    pub space_id: SpaceId,
}

struct Inner {
    store: ReservationStore,
    scheduler: ExpiryScheduler,
    directory: Arc<dyn SlotDirectory>,
    bookings: Arc<dyn BookingStore>,
    broadcaster: Arc<dyn Broadcaster>,
    /// Slot ID → operation lock.
    slot_locks: KeyedLocks<SlotId>,
    /// Space ID → aggregate publish lock.
    space_locks: KeyedLocks<SpaceId>,
    next_generation: AtomicU64,
    default_ttl: Duration,
    running: AtomicBool,
}

/// Orchestrates temporary slot holds, bookings, and their notifications.
///
/// Cheap to clone; every clone drives the same store and scheduler, so the
/// HTTP and WebSocket entry points share one view of every hold.
#[derive(Clone)]
pub struct ReservationCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ReservationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationCoordinator")
            .field("active_holds", &self.inner.store.len())
            .field("pending_timers", &self.inner.scheduler.pending())
            .field("locked_slots", &self.inner.slot_locks.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ReservationCoordinator {
    /// Creates a stopped coordinator. Call [`ReservationCoordinator::start`]
    /// before serving requests.
    pub fn new(
        config: &ReservationConfig,
        directory: Arc<dyn SlotDirectory>,
        bookings: Arc<dyn BookingStore>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: ReservationStore::new(),
                scheduler: ExpiryScheduler::new(),
                directory,
                bookings,
                broadcaster,
                slot_locks: KeyedLocks::new(),
                space_locks: KeyedLocks::new(),
                next_generation: AtomicU64::new(1),
                default_ttl: config.default_ttl(),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Begins accepting reservations.
    ///
    /// A coordinator that has been stopped cannot be started again.
    pub fn start(&self) -> AppResult<()> {
        if self.inner.scheduler.is_shut_down() {
            return Err(AppError::service_unavailable(
                "Reservation coordinator has been stopped",
            ));
        }
        self.inner.running.store(true, Ordering::SeqCst);
        info!(
            default_ttl_secs = self.inner.default_ttl.as_secs(),
            "Reservation coordinator started"
        );
        Ok(())
    }

    /// Cancels every outstanding timer and discards all holds.
    ///
    /// Holds are ephemeral: nothing is persisted and nothing is published.
    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        let timers = self.inner.scheduler.shutdown();
        let holds = self.inner.store.clear();
        self.inner.slot_locks.clear();
        self.inner.space_locks.clear();
        info!(
            cancelled_timers = timers,
            discarded_holds = holds,
            "Reservation coordinator stopped"
        );
    }

    /// Whether the coordinator is accepting reservations.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Hold duration used when a request does not name one.
    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Grants a temporary, exclusive hold on a slot.
    ///
    /// Rejected with `SLOT_UNAVAILABLE` when the directory does not offer the
    /// slot (including when the lookup fails) and with `ALREADY_RESERVED`
    /// when another hold is active. A rejection changes nothing.
    pub async fn reserve(&self, request: ReserveRequest) -> AppResult<Reservation> {
        self.ensure_running()?;
        let _slot = self.inner.slot_locks.lock(request.slot_id).await;

        let slot_id = request.slot_id;
        let space_id = match self.inner.directory.slot(slot_id).await {
            Ok(Some(slot)) if slot.available => {
                if slot.space_id != request.space_id {
                    warn!(
                        slot_id = %slot_id,
                        requested_space = %request.space_id,
                        directory_space = %slot.space_id,
                        "Reserve request named the wrong space, using directory space"
                    );
                }
                slot.space_id
            }
            Ok(_) => {
                debug!(slot_id = %slot_id, user_id = %request.user_id, "Reserve rejected: slot unavailable");
                return Err(AppError::slot_unavailable(format!(
                    "Slot {slot_id} is not available"
                )));
            }
            Err(e) => {
                warn!(slot_id = %slot_id, error = %e, "Directory lookup failed, rejecting reservation");
                return Err(AppError::with_source(
                    ErrorKind::SlotUnavailable,
                    format!("Slot {slot_id} availability could not be confirmed"),
                    e,
                ));
            }
        };

        let ttl = request.ttl.unwrap_or(self.inner.default_ttl);
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let reservation = Reservation {
            slot_id,
            space_id,
            user_id: request.user_id,
            user_name: request.user_name,
            created_at: Instant::now(),
            generation,
            reserved_at: Utc::now(),
            ttl,
        };

        if let Err(current) = self.inner.store.insert_if_absent(reservation.clone()) {
            debug!(
                slot_id = %slot_id,
                user_id = %reservation.user_id,
                holder = %current.user_id,
                "Reserve rejected: slot already held"
            );
            return Err(AppError::already_reserved(format!(
                "Slot {slot_id} is already reserved"
            )));
        }

        // A concurrent stop may have cleared the store before this insert.
        if !self.is_running() {
            self.inner
                .store
                .remove_if(slot_id, Holder::Generation(generation));
            debug!(slot_id = %slot_id, "Reserve abandoned: coordinator stopped");
            return Err(AppError::service_unavailable(
                "Reservation coordinator is not running",
            ));
        }

        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .schedule_release(slot_id, generation, ttl, move || async move {
                if let Some(inner) = weak.upgrade() {
                    ReservationCoordinator { inner }
                        .expire(slot_id, generation)
                        .await;
                }
            });

        info!(
            slot_id = %slot_id,
            space_id = %space_id,
            user_id = %reservation.user_id,
            ttl_secs = ttl.as_secs(),
            "Slot reserved"
        );

        self.publish_slot_event(NotificationEvent::reserved(
            slot_id,
            space_id,
            reservation.user_id,
            &reservation.user_name,
        ))
        .await;
        self.recompute_and_publish(space_id).await;

        Ok(reservation)
    }

    /// Releases an active hold.
    ///
    /// Returns `NOT_RESERVED` when the slot has no hold, or none owned by
    /// `request.user_id` when that is given.
    pub async fn release(&self, request: ReleaseRequest) -> AppResult<Reservation> {
        let slot_id = request.slot_id;
        let _slot = self.inner.slot_locks.lock(slot_id).await;

        let holder = request.user_id.map_or(Holder::Any, Holder::User);
        let Some(released) = self.inner.store.remove_if(slot_id, holder) else {
            debug!(slot_id = %slot_id, "Release rejected: no matching hold");
            return Err(AppError::not_reserved(format!("Slot {slot_id} is not reserved")));
        };
        self.inner.scheduler.cancel(slot_id, released.generation);

        if released.space_id != request.space_id {
            warn!(
                slot_id = %slot_id,
                requested_space = %request.space_id,
                held_space = %released.space_id,
                "Release request named the wrong space, using held space"
            );
        }

        info!(
            slot_id = %slot_id,
            space_id = %released.space_id,
            user_id = %released.user_id,
            "Slot released"
        );

        self.publish_slot_event(NotificationEvent::released(slot_id, released.space_id))
            .await;
        self.recompute_and_publish(released.space_id).await;

        Ok(released)
    }

    /// Finalizes a booking.
    ///
    /// Records the booking, flags the slot unavailable in the directory, then
    /// drops any hold on the slot whoever owns it. If the directory write
    /// fails the recorded booking is cancelled, any hold stays intact, and
    /// nothing is published.
    pub async fn book(&self, request: BookRequest) -> AppResult<BookingConfirmation> {
        self.ensure_running()?;
        let slot_id = request.slot_id;
        let _slot = self.inner.slot_locks.lock(slot_id).await;

        let booking_ref = self
            .inner
            .bookings
            .record(slot_id, request.space_id, request.user_id)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::DirectoryWriteFailed,
                    format!("Booking for slot {slot_id} could not be recorded"),
                    e,
                )
            })?;

        if let Err(e) = self.inner.directory.mark_unavailable(slot_id).await {
            error!(slot_id = %slot_id, booking_ref = %booking_ref, error = %e, "Directory write failed, cancelling booking");
            if let Err(cancel_err) = self.inner.bookings.cancel(booking_ref).await {
                error!(booking_ref = %booking_ref, error = %cancel_err, "Failed to cancel orphaned booking");
            }
            return Err(AppError::with_source(
                ErrorKind::DirectoryWriteFailed,
                format!("Slot {slot_id} could not be marked as booked"),
                e,
            ));
        }

        let released = self.inner.store.remove_if(slot_id, Holder::Any);
        let space_id = match &released {
            Some(hold) => {
                self.inner.scheduler.cancel(slot_id, hold.generation);
                if hold.user_id != request.user_id {
                    warn!(
                        slot_id = %slot_id,
                        holder = %hold.user_id,
                        booker = %request.user_id,
                        "Booking replaced another user's hold"
                    );
                }
                hold.space_id
            }
            None => request.space_id,
        };

        info!(
            slot_id = %slot_id,
            space_id = %space_id,
            user_id = %request.user_id,
            booking_ref = %booking_ref,
            had_hold = released.is_some(),
            "Slot booked"
        );

        self.publish_slot_event(NotificationEvent::booked(slot_id, space_id, request.user_id))
            .await;
        self.recompute_and_publish(space_id).await;

        Ok(BookingConfirmation {
            booking_ref,
            slot_id,
            space_id,
        })
    }

    /// Timer callback: releases the hold identified by `generation` if it
    /// is still the one on the slot. Anything else is a silent no-op.
    async fn expire(&self, slot_id: SlotId, generation: u64) {
        let _slot = self.inner.slot_locks.lock(slot_id).await;

        let Some(expired) = self
            .inner
            .store
            .remove_if(slot_id, Holder::Generation(generation))
        else {
            debug!(slot_id = %slot_id, generation, "Expiry found no matching hold");
            return;
        };

        info!(
            slot_id = %slot_id,
            space_id = %expired.space_id,
            user_id = %expired.user_id,
            "Reservation timed out"
        );

        self.publish_slot_event(NotificationEvent::timeout(slot_id, expired.space_id))
            .await;
        self.recompute_and_publish(expired.space_id).await;
    }

    /// Current availability of a space.
    ///
    /// A slot counts as available when the directory offers it and no hold
    /// is active on it.
    pub async fn space_summary(
        &self,
        space_id: SpaceId,
        action: SlotAction,
    ) -> AppResult<SpaceAvailabilitySummary> {
        let slots = self.inner.directory.list_slots(space_id).await?;
        if slots.is_empty() {
            return Err(AppError::not_found(format!("Space {space_id} has no slots")));
        }

        let available = slots
            .iter()
            .filter(|slot| slot.available && !self.inner.store.contains(slot.slot_id))
            .count();

        Ok(SpaceAvailabilitySummary::new(
            space_id,
            u32::try_from(available).unwrap_or(u32::MAX),
            u32::try_from(slots.len()).unwrap_or(u32::MAX),
            action,
        ))
    }

    /// The summary delivered to a new `space/{id}` subscriber.
    pub async fn initial_status(&self, space_id: SpaceId) -> AppResult<SpaceAvailabilitySummary> {
        self.space_summary(space_id, SlotAction::InitialStatus).await
    }

    /// Recomputes a space's availability and publishes it to the space's
    /// aggregate topic. Failures are logged.
    ///
    /// Computation and publish happen under one per-space lock, so the last
    /// summary published for a space always reflects its latest state.
    pub async fn recompute_and_publish(&self, space_id: SpaceId) {
        let _space = self.inner.space_locks.lock(space_id).await;
        let summary = match self
            .space_summary(space_id, SlotAction::AvailabilityUpdate)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(space_id = %space_id, error = %e, "Could not recompute space availability");
                return;
            }
        };

        let topic = Topic::SpaceAggregate(space_id);
        if let Err(e) = self
            .inner
            .broadcaster
            .publish(&topic, Notification::Space(summary))
            .await
        {
            warn!(topic = %topic, kind = %ErrorKind::BroadcastFailed, error = %e, "Failed to publish availability update");
        }
    }

    /// Subscribes to a topic.
    ///
    /// `space/{id}` subscribers first receive one `INITIAL_STATUS` summary,
    /// then live events.
    pub async fn subscribe(&self, topic: Topic) -> AppResult<NotificationStream> {
        let live = self.inner.broadcaster.subscribe(&topic).await?;

        let Topic::Space(space_id) = topic else {
            return Ok(live);
        };

        match self.initial_status(space_id).await {
            Ok(summary) => Ok(stream::iter([Notification::Space(summary)])
                .chain(live)
                .boxed()),
            Err(e) => {
                debug!(space_id = %space_id, error = %e, "No initial status for subscription");
                Ok(live)
            }
        }
    }

    /// The active hold on a slot, if any.
    pub fn reservation(&self, slot_id: SlotId) -> Option<Reservation> {
        self.inner.store.get(slot_id)
    }

    /// Every active hold, ordered by slot.
    pub fn active_reservations(&self) -> Vec<Reservation> {
        self.inner.store.snapshot()
    }

    /// Number of active holds.
    pub fn active_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Number of expiry timers still outstanding.
    pub fn pending_timers(&self) -> usize {
        self.inner.scheduler.pending()
    }

    /// Number of slots with an operation in flight.
    pub fn locked_slots(&self) -> usize {
        self.inner.slot_locks.len()
    }

    fn ensure_running(&self) -> AppResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(AppError::service_unavailable(
                "Reservation coordinator is not running",
            ))
        }
    }

    /// Publishes a slot event to `all-slots`, then to `space/{id}`.
    async fn publish_slot_event(&self, event: NotificationEvent) {
        let topics = [Topic::AllSlots, Topic::Space(event.space_id)];
        for topic in topics {
            if let Err(e) = self
                .inner
                .broadcaster
                .publish(&topic, Notification::Slot(event.clone()))
                .await
            {
                warn!(
                    topic = %topic,
                    slot_id = %event.slot_id,
                    kind = %ErrorKind::BroadcastFailed,
                    error = %e,
                    "Failed to publish slot event"
                );
            }
        }
    }
}

