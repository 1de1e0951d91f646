//! Command execution core: definitions, gating, cooldowns, and dispatch.

pub mod cooldown;
pub mod definition;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod respond;
pub mod types;

pub use cooldown::CooldownTracker;
pub use definition::{CommandDef, CommandHandler, HandlerContext, validate_command_name};
pub use dispatcher::Dispatcher;
pub use error::CommandError;
pub use gate::{CommandGate, GateDecision};
pub use respond::{Reply, Responder, ResponseHandle};
pub use types::{Cooldown, CooldownScope, DispatchOutcome, Invocation, Rejection};
