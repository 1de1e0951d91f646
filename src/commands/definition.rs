//! Data-described command definitions.
//!
//! A command is a record of gate metadata plus a handler, not a subclass.
//! Groups are routing nodes that only hold children; gate metadata is read
//! off the resolved leaf alone.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::CommandError;
use super::respond::ResponseHandle;
use super::types::{Cooldown, Invocation};
use crate::access::AccessLevel;
use crate::correlator::EventCorrelator;
use crate::permissions::ChannelPermissions;

/// Everything a handler receives for one gated invocation.
#[derive(Clone)]
pub struct HandlerContext {
    pub invocation: Invocation,
    /// Invoker's resolved level, for handlers that branch on it.
    pub access_level: AccessLevel,
    /// Shared correlator for interactive follow-ups.
    pub correlator: EventCorrelator,
    /// Single-use response slot for this invocation.
    pub response: ResponseHandle,
}

/// Business logic behind a leaf command.
///
/// Handlers respond through `ctx.response` and may register correlator waits
/// for follow-up interactions. A returned error is reported by the
/// dispatcher; it never tears down the dispatch loop.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, ctx: HandlerContext) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// One node in the command tree.
#[derive(Clone)]
pub struct CommandDef {
    name: String,
    /// Minimum effective level to pass the gate.
    pub access_level: AccessLevel,
    /// Channel permissions the bot itself needs before running.
    pub bot_permissions: ChannelPermissions,
    /// Reuse limit, if any.
    pub cooldown: Option<Cooldown>,
    /// Whether the command only works inside a guild.
    pub guild_only: bool,
    children: Vec<CommandDef>,
    handler: Option<Arc<dyn CommandHandler>>,
}

impl CommandDef {
    /// An executable leaf. Starts guild-only, open to everyone, with no
    /// permission or cooldown requirements.
    pub fn leaf(name: &str, handler: Arc<dyn CommandHandler>) -> Result<Self, CommandError> {
        validate_command_name(name)?;
        Ok(Self {
            name: name.to_string(),
            access_level: AccessLevel::All,
            bot_permissions: ChannelPermissions::empty(),
            cooldown: None,
            guild_only: true,
            children: Vec::new(),
            handler: Some(handler),
        })
    }

    /// A routing node. Children must have distinct names; gate metadata on a
    /// group is never consulted.
    pub fn group(name: &str, children: Vec<CommandDef>) -> Result<Self, CommandError> {
        validate_command_name(name)?;
        for (index, child) in children.iter().enumerate() {
            if children[..index].iter().any(|c| c.name == child.name) {
                return Err(CommandError::DuplicateName(child.name.clone()));
            }
        }
        Ok(Self {
            name: name.to_string(),
            access_level: AccessLevel::All,
            bot_permissions: ChannelPermissions::empty(),
            cooldown: None,
            guild_only: true,
            children,
            handler: None,
        })
    }

    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    #[must_use]
    pub fn with_bot_permissions(mut self, permissions: ChannelPermissions) -> Self {
        self.bot_permissions = permissions;
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Cooldown) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Allow use in direct messages.
    #[must_use]
    pub const fn dm_capable(mut self) -> Self {
        self.guild_only = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.handler.is_some()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(super) fn handler(&self) -> Option<Arc<dyn CommandHandler>> {
        self.handler.clone()
    }
}

impl std::fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("access_level", &self.access_level)
            .field("bot_permissions", &self.bot_permissions)
            .field("cooldown", &self.cooldown)
            .field("guild_only", &self.guild_only)
            .field("children", &self.children)
            .field("leaf", &self.is_leaf())
            .finish()
    }
}

/// Command names are what the platform routes on. Lowercase ASCII letters,
/// digits, `-` and `_`, at most 32 chars.
pub fn validate_command_name(name: &str) -> Result<(), CommandError> {
    let valid_len = (1..=32).contains(&name.len());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(CommandError::InvalidName(name.to_string()))
    }
}
