//! Process-level wiring of the command core.

use std::sync::Arc;

use anyhow::Result;

use crate::access::{AccessStore, GrantStore, PgGrantStore};
use crate::commands::{
    CommandDef, CommandError, CommandGate, CooldownTracker, Dispatcher, Responder,
};
use crate::config::Config;
use crate::correlator::EventCorrelator;
use crate::db;
use crate::events::InteractionEvent;

/// One wired instance of the command core.
///
/// Owns the single correlator, access store, and cooldown tracker the
/// dispatcher and handlers share; nothing here is process-global. The
/// platform shell feeds `dispatch` with decoded invocations and
/// `deliver_event` with component interactions.
#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub correlator: EventCorrelator,
    pub access: AccessStore,
    pub cooldowns: CooldownTracker,
    pub dispatcher: Dispatcher,
}

impl App {
    /// Wire the core over an arbitrary grant backend.
    pub fn new(
        config: Config,
        backend: Arc<dyn GrantStore>,
        responder: Arc<dyn Responder>,
        commands: Vec<CommandDef>,
    ) -> Result<Self, CommandError> {
        let correlator = EventCorrelator::new();
        let access = AccessStore::new(backend, config.access_cache_size);
        let cooldowns = CooldownTracker::new();
        let gate = CommandGate::new(access.clone(), cooldowns.clone(), config.owner_id);
        let dispatcher = Dispatcher::new(gate, correlator.clone(), responder, commands)?;

        Ok(Self {
            config,
            correlator,
            access,
            cooldowns,
            dispatcher,
        })
    }

    /// Connect PostgreSQL, run migrations, and wire the core over it.
    pub async fn connect(
        config: Config,
        responder: Arc<dyn Responder>,
        commands: Vec<CommandDef>,
    ) -> Result<Self> {
        let pool = db::create_pool(&config).await?;
        db::run_migrations(&pool).await?;
        let backend: Arc<dyn GrantStore> = Arc::new(PgGrantStore::new(pool));
        Ok(Self::new(config, backend, responder, commands)?)
    }

    /// Offer one gateway interaction to the correlator. Returns whether a
    /// pending wait consumed it.
    pub fn deliver_event(&self, event: &InteractionEvent) -> bool {
        self.correlator.deliver(event)
    }
}
