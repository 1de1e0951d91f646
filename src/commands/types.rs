//! Shared command-layer types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AccessLevel;
use crate::permissions::ChannelPermissions;

/// Scope over which a command's reuse timer is keyed.
///
/// Guild-wide scopes degrade to their channel equivalent when the command is
/// used outside a guild, so direct-message usage still gets a timer instead
/// of an unkeyable scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownScope {
    /// One timer per invoking user, anywhere.
    User,
    /// One timer per channel, shared by everyone in it.
    Channel,
    /// One timer per user per channel.
    UserChannel,
    /// One timer per guild, shared by everyone in it.
    Guild,
    /// One timer per user per guild.
    UserGuild,
    /// A single timer for the whole process.
    Global,
}

impl CooldownScope {
    /// Build the tracker key for an invocation of `command_path`.
    #[must_use]
    pub fn key(
        self,
        command_path: &str,
        user_id: i64,
        channel_id: i64,
        guild_id: Option<i64>,
    ) -> String {
        match (self, guild_id) {
            (Self::Global, _) => command_path.to_string(),
            (Self::User, _) => format!("{command_path}|U:{user_id}"),
            (Self::Channel, _) => format!("{command_path}|C:{channel_id}"),
            (Self::UserChannel, _) => format!("{command_path}|U:{user_id}|C:{channel_id}"),
            (Self::Guild, Some(guild)) => format!("{command_path}|G:{guild}"),
            (Self::Guild, None) => Self::Channel.key(command_path, user_id, channel_id, None),
            (Self::UserGuild, Some(guild)) => format!("{command_path}|U:{user_id}|G:{guild}"),
            (Self::UserGuild, None) => {
                Self::UserChannel.key(command_path, user_id, channel_id, None)
            }
        }
    }
}

/// Reuse limit declared on a leaf command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub duration: Duration,
    pub scope: CooldownScope,
}

impl Cooldown {
    #[must_use]
    pub const fn new(duration: Duration, scope: CooldownScope) -> Self {
        Self { duration, scope }
    }
}

/// One command invocation as decoded by the platform shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Platform id of the interaction; the single response references it.
    pub interaction_id: Uuid,
    /// Invoked path segments, outermost first, e.g. `["mod", "mute"]`.
    pub command_path: Vec<String>,
    /// Guild the command was used in (`None` for direct messages).
    pub guild_id: Option<i64>,
    /// Owner of that guild, when known. Feeds the owner override.
    pub guild_owner_id: Option<i64>,
    pub channel_id: i64,
    pub user_id: i64,
    /// Roles the invoking member holds.
    #[serde(default)]
    pub member_role_ids: Vec<i64>,
    /// Bot's effective permissions in the target channel.
    pub bot_permissions: ChannelPermissions,
    /// Raw option payload, interpreted by the handler.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl Invocation {
    /// Dotted form of the invoked path, used for cooldown keys and logs.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.command_path.join(".")
    }
}

/// Structured refusal produced by the gate.
///
/// The rendering collaborator turns `path()` into localized text and
/// interpolates `detail()`; the core never renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Guild-only command used outside a guild.
    NotGuild,
    /// Bot lacks channel permissions the command declared; carries the
    /// missing set.
    MissingBotPermission(ChannelPermissions),
    /// Invoker's effective level is below the command's minimum.
    InsufficientAccess { required: AccessLevel },
    /// The reuse timer has not elapsed yet.
    Cooldown { remaining: Duration },
}

impl Rejection {
    /// Message-catalog key for the rendered refusal.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::NotGuild => "errors.command.guild_only",
            Self::MissingBotPermission(_) => "errors.command.missing_bot_permission",
            Self::InsufficientAccess { .. } => "errors.command.insufficient_access",
            Self::Cooldown { .. } => "errors.command.cooldown",
        }
    }

    /// Value interpolated into the rendered message, when one applies.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::NotGuild => None,
            Self::MissingBotPermission(missing) => Some(missing.to_string()),
            Self::InsufficientAccess { required } => Some(required.as_str().to_string()),
            Self::Cooldown { remaining } => {
                // Report whole seconds, rounded up so "1ms left" reads as 1s.
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                Some(secs.to_string())
            }
        }
    }
}

/// Terminal state of one dispatched invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Gate passed and the handler finished cleanly.
    Completed,
    /// The gate or handler hit an internal error; it was reported once and
    /// the dispatch loop carries on.
    Failed,
    /// The gate refused the invocation.
    Rejected(Rejection),
    /// No leaf command matched the invoked path.
    NotFound,
}
