//! Predicate-based correlation of future interaction events.
//!
//! A command handler registers a wait for the next event of some kind that
//! satisfies a predicate (say, a select menu used on the message the command
//! just posted). The first matching event consumes the wait and runs its
//! match continuation with the event; if nothing matches within the timeout,
//! the timeout continuation runs instead. Exactly one of the two fires, no
//! matter how delivery and the deadline race.
//!
//! Delivery is synchronous and never blocks on continuations; they are
//! spawned onto the runtime. Waits are not persisted and there is no cancel
//! beyond the deadline, so callers own keeping timeouts reasonable.

mod wait;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error};
use uuid::Uuid;

use self::wait::PendingWait;
use crate::events::{EventKind, InteractionEvent};

/// Handle returned by [`EventCorrelator::register_wait`].
///
/// Carries no cancel authority; it only observes whether the wait has been
/// consumed by a match or its timeout.
#[derive(Debug, Clone)]
pub struct WaitHandle {
    id: Uuid,
    resolved: Arc<AtomicBool>,
}

impl WaitHandle {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

/// Correlates registered waits with incoming interaction events.
///
/// Cheap to clone; clones share the pending-wait table. Construct one per
/// process and hand it to every consumer.
#[derive(Clone)]
pub struct EventCorrelator {
    inner: Arc<Inner>,
}

struct Inner {
    pending: DashMap<EventKind, Vec<Arc<PendingWait>>>,
}

impl EventCorrelator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: DashMap::new(),
            }),
        }
    }

    /// Register a wait for the next `kind` event matching `predicate`.
    ///
    /// `on_match` receives the consuming event; `on_timeout` runs if the
    /// deadline elapses first. The two are mutually exclusive. Continuations
    /// run as spawned tasks and a panic in one is logged, not propagated.
    pub fn register_wait<P, M, MFut, T, TFut>(
        &self,
        kind: EventKind,
        timeout: Duration,
        predicate: P,
        on_match: M,
        on_timeout: T,
    ) -> WaitHandle
    where
        P: Fn(&InteractionEvent) -> bool + Send + Sync + 'static,
        M: FnOnce(InteractionEvent) -> MFut + Send + 'static,
        MFut: Future<Output = ()> + Send + 'static,
        T: FnOnce() -> TFut + Send + 'static,
        TFut: Future<Output = ()> + Send + 'static,
    {
        let wait = Arc::new(PendingWait::new(
            Box::new(predicate),
            Box::new(move |event| on_match(event).boxed()),
            Box::new(move || on_timeout().boxed()),
        ));
        let handle = WaitHandle {
            id: wait.id,
            resolved: wait.resolved_flag(),
        };

        self.inner
            .pending
            .entry(kind)
            .or_default()
            .push(Arc::clone(&wait));
        debug!(wait_id = %wait.id, kind = kind.as_str(), ?timeout, "wait registered");

        // Each wait schedules its own deadline; the timer task touches no
        // state but its own wait's.
        let correlator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if wait.try_resolve() {
                correlator.remove(kind, wait.id);
                debug!(wait_id = %wait.id, "wait timed out");
                if let Some(action) = wait.take_timeout_action() {
                    run_continuation(wait.id, action()).await;
                }
            }
        });

        handle
    }

    /// Offer an event to the pending waits of its kind.
    ///
    /// Waits are evaluated in registration order and the first unresolved one
    /// whose predicate matches claims the event; its match continuation is
    /// spawned with a clone of the event. Returns whether the event was
    /// consumed. Later events can never re-trigger a consumed wait.
    pub fn deliver(&self, event: &InteractionEvent) -> bool {
        // Snapshot so predicates run without holding the map lock; new waits
        // registered mid-delivery are only eligible for the next event.
        let snapshot: Vec<Arc<PendingWait>> = match self.inner.pending.get(&event.kind) {
            Some(waits) => waits.clone(),
            None => return false,
        };

        for wait in snapshot {
            if wait.is_resolved() || !wait.matches(event) {
                continue;
            }
            // The timeout path may be racing us for this wait.
            if !wait.try_resolve() {
                continue;
            }
            self.remove(event.kind, wait.id);
            debug!(wait_id = %wait.id, kind = event.kind.as_str(), "wait matched");
            if let Some(action) = wait.take_match_action() {
                let wait_id = wait.id;
                let event = event.clone();
                tokio::spawn(async move {
                    run_continuation(wait_id, action(event)).await;
                });
            }
            return true;
        }
        false
    }

    /// Number of unconsumed waits currently registered for a kind.
    #[must_use]
    pub fn pending_count(&self, kind: EventKind) -> usize {
        self.inner.pending.get(&kind).map_or(0, |waits| waits.len())
    }

    fn remove(&self, kind: EventKind, id: Uuid) {
        if let Some(mut waits) = self.inner.pending.get_mut(&kind) {
            waits.retain(|wait| wait.id != id);
        }
    }
}

impl Default for EventCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a one-shot continuation, containing a panic to this wait.
async fn run_continuation(wait_id: Uuid, action: BoxFuture<'static, ()>) {
    if AssertUnwindSafe(action).catch_unwind().await.is_err() {
        error!(%wait_id, "wait continuation panicked");
    }
}
