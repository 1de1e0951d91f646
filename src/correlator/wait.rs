//! Pending wait bookkeeping.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::events::InteractionEvent;

pub(super) type Predicate = Box<dyn Fn(&InteractionEvent) -> bool + Send + Sync>;
pub(super) type MatchAction = Box<dyn FnOnce(InteractionEvent) -> BoxFuture<'static, ()> + Send>;
pub(super) type TimeoutAction = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// A registered wait.
///
/// The `resolved` flag is the only synchronization between the delivery path
/// and the timeout path: whichever side wins the test-and-set takes its
/// one-shot continuation, the loser does nothing.
pub(super) struct PendingWait {
    pub(super) id: Uuid,
    predicate: Predicate,
    resolved: Arc<AtomicBool>,
    on_match: Mutex<Option<MatchAction>>,
    on_timeout: Mutex<Option<TimeoutAction>>,
}

impl PendingWait {
    pub(super) fn new(
        predicate: Predicate,
        on_match: MatchAction,
        on_timeout: TimeoutAction,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            predicate,
            resolved: Arc::new(AtomicBool::new(false)),
            on_match: Mutex::new(Some(on_match)),
            on_timeout: Mutex::new(Some(on_timeout)),
        }
    }

    pub(super) fn resolved_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.resolved)
    }

    pub(super) fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Run the predicate against an event. A panicking predicate counts as a
    /// non-match and must not abort evaluation of other waits.
    pub(super) fn matches(&self, event: &InteractionEvent) -> bool {
        panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(event))).unwrap_or_else(|_| {
            warn!(wait_id = %self.id, "wait predicate panicked, treated as non-match");
            false
        })
    }

    /// Claim the wait. Exactly one caller over the wait's lifetime gets
    /// `true`.
    pub(super) fn try_resolve(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(super) fn take_match_action(&self) -> Option<MatchAction> {
        self.on_match
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(super) fn take_timeout_action(&self) -> Option<TimeoutAction> {
        self.on_timeout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
