//! Outward response port.
//!
//! The core never renders text; it hands a message-catalog path plus an
//! optional detail to a platform-side [`Responder`]. A [`ResponseHandle`]
//! wraps the responder for one invocation and guarantees at most one
//! response goes out, however the gate, handler, and error reporting
//! interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

/// Rendering-agnostic response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    /// Message-catalog path of the response body.
    pub path: String,
    /// Interpolation detail, when one applies.
    pub detail: Option<String>,
    /// Whether only the invoker should see it.
    pub ephemeral: bool,
}

impl Reply {
    #[must_use]
    pub fn new(path: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            path: path.into(),
            detail,
            ephemeral: false,
        }
    }

    #[must_use]
    pub fn ephemeral(path: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            path: path.into(),
            detail,
            ephemeral: true,
        }
    }
}

/// Platform collaborator that renders and delivers responses.
pub trait Responder: Send + Sync {
    /// Deliver the response for an interaction.
    fn respond(&self, interaction_id: Uuid, reply: Reply) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// Single-use response slot for one invocation.
///
/// The first `send` wins; later attempts are suppressed with a warning so an
/// invocation can never answer twice. Cheap to clone into correlator
/// continuations; clones share the slot.
#[derive(Clone)]
pub struct ResponseHandle {
    responder: Arc<dyn Responder>,
    interaction_id: Uuid,
    used: Arc<AtomicBool>,
}

impl ResponseHandle {
    #[must_use]
    pub fn new(responder: Arc<dyn Responder>, interaction_id: Uuid) -> Self {
        Self {
            responder,
            interaction_id,
            used: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn interaction_id(&self) -> Uuid {
        self.interaction_id
    }

    /// Whether a response has already gone out for this invocation.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    /// Send the invocation's single response.
    ///
    /// Suppressed duplicates return `Ok`; only delivery failures of the
    /// winning send surface as errors.
    pub async fn send(&self, reply: Reply) -> anyhow::Result<()> {
        if self.used.swap(true, Ordering::AcqRel) {
            warn!(interaction_id = %self.interaction_id, path = %reply.path, "duplicate response suppressed");
            return Ok(());
        }
        self.responder.respond(self.interaction_id, reply).await
    }
}
