//! Invocation routing.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::definition::{CommandDef, HandlerContext};
use super::error::CommandError;
use super::gate::{CommandGate, GateDecision};
use super::respond::{Reply, Responder, ResponseHandle};
use super::types::{DispatchOutcome, Invocation};
use crate::correlator::EventCorrelator;

/// Routes decoded invocations to leaf commands through the gate.
///
/// Owns the registered command tree. Every invocation produces exactly one
/// outward response: the handler's on success, a rejection or error notice
/// otherwise. Handler and storage failures are reported and contained; the
/// dispatch loop itself never dies from one.
#[derive(Clone)]
pub struct Dispatcher {
    commands: Arc<Vec<CommandDef>>,
    gate: CommandGate,
    correlator: EventCorrelator,
    responder: Arc<dyn Responder>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Build a dispatcher over a validated command tree. Root commands must
    /// have distinct names; groups validate their children on construction.
    pub fn new(
        gate: CommandGate,
        correlator: EventCorrelator,
        responder: Arc<dyn Responder>,
        commands: Vec<CommandDef>,
    ) -> Result<Self, CommandError> {
        for (index, def) in commands.iter().enumerate() {
            if commands[..index].iter().any(|d| d.name() == def.name()) {
                return Err(CommandError::DuplicateName(def.name().to_string()));
            }
        }
        info!(commands = commands.len(), "command dispatcher ready");
        Ok(Self {
            commands: Arc::new(commands),
            gate,
            correlator,
            responder,
        })
    }

    /// The registered tree, for the platform shell to sync upstream.
    #[must_use]
    pub fn commands(&self) -> &[CommandDef] {
        &self.commands
    }

    /// Resolve, gate, and run one invocation.
    pub async fn dispatch(&self, invocation: Invocation) -> DispatchOutcome {
        let path = invocation.dotted_path();

        let Some(leaf) = resolve(&self.commands, &invocation.command_path) else {
            warn!(path, "no leaf command matches the invoked path");
            return DispatchOutcome::NotFound;
        };

        let response =
            ResponseHandle::new(Arc::clone(&self.responder), invocation.interaction_id);

        let decision = match self.gate.check(leaf, &path, &invocation).await {
            Ok(decision) => decision,
            Err(err) => {
                // Recoverable: report once and keep serving other commands.
                error!(error = %err, path, "access lookup failed during gating");
                deliver(&response, Reply::ephemeral("errors.database", None)).await;
                return DispatchOutcome::Failed;
            }
        };

        match decision {
            GateDecision::Reject(rejection) => {
                debug!(path, rejection = rejection.path(), "invocation rejected");
                deliver(
                    &response,
                    Reply::ephemeral(rejection.path(), rejection.detail()),
                )
                .await;
                DispatchOutcome::Rejected(rejection)
            }
            GateDecision::Pass(level) => {
                let Some(handler) = leaf.handler() else {
                    // resolve() only returns leaves; unreachable in practice.
                    return DispatchOutcome::NotFound;
                };
                let ctx = HandlerContext {
                    invocation,
                    access_level: level,
                    correlator: self.correlator.clone(),
                    response: response.clone(),
                };
                match handler.handle(ctx).await {
                    Ok(()) => DispatchOutcome::Completed,
                    Err(err) => {
                        error!(error = %err, path, "command handler failed");
                        deliver(&response, Reply::ephemeral("errors.internal", None)).await;
                        DispatchOutcome::Failed
                    }
                }
            }
        }
    }
}

/// Descend the tree by name, one segment per level. Only a leaf at the end
/// of the full path resolves.
fn resolve<'a>(roots: &'a [CommandDef], segments: &[String]) -> Option<&'a CommandDef> {
    let (first, rest) = segments.split_first()?;
    let mut node = roots.iter().find(|def| def.name() == first.as_str())?;
    for segment in rest {
        node = node.child(segment)?;
    }
    node.is_leaf().then_some(node)
}

async fn deliver(response: &ResponseHandle, reply: Reply) {
    if let Err(err) = response.send(reply).await {
        error!(error = %err, interaction_id = %response.interaction_id(), "failed to deliver response");
    }
}
