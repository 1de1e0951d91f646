//! Pre-execution checks.

use tracing::debug;

use super::cooldown::CooldownTracker;
use super::definition::CommandDef;
use super::types::{Invocation, Rejection};
use crate::access::{AccessError, AccessLevel, AccessStore, resolve_member_level};

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// All checks passed; carries the invoker's effective level.
    Pass(AccessLevel),
    /// A check failed; carries the single rejection to render.
    Reject(Rejection),
}

/// Runs the fixed check sequence in front of every leaf handler: guild
/// scope, bot permissions, access level, cooldown.
///
/// The cooldown is started only after every other check passes, so a
/// rejected invocation never burns the invoker's timer. Cheap to clone;
/// clones share the access store and tracker.
#[derive(Clone)]
pub struct CommandGate {
    access: AccessStore,
    cooldowns: CooldownTracker,
    global_owner_id: i64,
}

impl CommandGate {
    #[must_use]
    pub const fn new(access: AccessStore, cooldowns: CooldownTracker, global_owner_id: i64) -> Self {
        Self {
            access,
            cooldowns,
            global_owner_id,
        }
    }

    /// Check one invocation against a resolved leaf.
    ///
    /// `path` is the dotted command path, used to key the cooldown. Storage
    /// failures during level resolution surface as `Err` for the dispatcher
    /// to report; they are not rejections.
    pub async fn check(
        &self,
        leaf: &CommandDef,
        path: &str,
        invocation: &Invocation,
    ) -> Result<GateDecision, AccessError> {
        if leaf.guild_only && invocation.guild_id.is_none() {
            return Ok(GateDecision::Reject(Rejection::NotGuild));
        }

        let missing = leaf.bot_permissions.missing_from(invocation.bot_permissions);
        if !missing.is_empty() {
            return Ok(GateDecision::Reject(Rejection::MissingBotPermission(
                missing,
            )));
        }

        let level = resolve_member_level(
            &self.access,
            self.global_owner_id,
            invocation.guild_id,
            invocation.guild_owner_id,
            invocation.user_id,
            &invocation.member_role_ids,
        )
        .await?;
        if level < leaf.access_level {
            return Ok(GateDecision::Reject(Rejection::InsufficientAccess {
                required: leaf.access_level,
            }));
        }

        if let Some(cooldown) = leaf.cooldown {
            let key = cooldown.scope.key(
                path,
                invocation.user_id,
                invocation.channel_id,
                invocation.guild_id,
            );
            if let Some(remaining) = self.cooldowns.remaining(&key) {
                return Ok(GateDecision::Reject(Rejection::Cooldown { remaining }));
            }
            self.cooldowns.apply(&key, cooldown.duration);
        }

        debug!(path, user_id = invocation.user_id, level = level.as_str(), "gate passed");
        Ok(GateDecision::Pass(level))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::FutureExt;
    use futures::future::BoxFuture;

    use super::*;
    use crate::access::MemoryGrantStore;
    use crate::commands::definition::{CommandHandler, HandlerContext};
    use crate::commands::types::{Cooldown, CooldownScope};
    use crate::permissions::ChannelPermissions;

    struct NoopHandler;

    impl CommandHandler for NoopHandler {
        fn handle(&self, _ctx: HandlerContext) -> BoxFuture<'static, anyhow::Result<()>> {
            async { Ok(()) }.boxed()
        }
    }

    const GLOBAL_OWNER: i64 = 999;

    fn gate() -> (CommandGate, AccessStore) {
        let store = AccessStore::new(Arc::new(MemoryGrantStore::default()), 16);
        let gate = CommandGate::new(store.clone(), CooldownTracker::new(), GLOBAL_OWNER);
        (gate, store)
    }

    fn mute_def() -> CommandDef {
        CommandDef::leaf("mute", Arc::new(NoopHandler))
            .unwrap()
            .with_access_level(AccessLevel::Mod)
            .with_bot_permissions(ChannelPermissions::MODERATE_MEMBERS)
            .with_cooldown(Cooldown::new(Duration::from_secs(10), CooldownScope::Guild))
    }

    fn invocation(user_id: i64, guild_id: Option<i64>) -> Invocation {
        Invocation {
            interaction_id: uuid::Uuid::now_v7(),
            command_path: vec!["mute".to_string()],
            guild_id,
            guild_owner_id: Some(1),
            channel_id: 55,
            user_id,
            member_role_ids: vec![50],
            bot_permissions: ChannelPermissions::MODERATE_MEMBERS
                | ChannelPermissions::SEND_MESSAGES,
            options: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_guild_only_rejected_in_dms() {
        let (gate, _) = gate();
        let decision = gate.check(&mute_def(), "mute", &invocation(2, None)).await.unwrap();
        assert_eq!(decision, GateDecision::Reject(Rejection::NotGuild));
    }

    #[tokio::test]
    async fn test_missing_bot_permission_carries_the_missing_set() {
        let (gate, _) = gate();
        let mut inv = invocation(2, Some(9));
        inv.bot_permissions = ChannelPermissions::SEND_MESSAGES;

        let decision = gate.check(&mute_def(), "mute", &inv).await.unwrap();
        assert_eq!(
            decision,
            GateDecision::Reject(Rejection::MissingBotPermission(
                ChannelPermissions::MODERATE_MEMBERS
            ))
        );
    }

    #[tokio::test]
    async fn test_insufficient_access_rejected() {
        let (gate, _) = gate();
        let decision = gate.check(&mute_def(), "mute", &invocation(2, Some(9))).await.unwrap();
        assert_eq!(
            decision,
            GateDecision::Reject(Rejection::InsufficientAccess {
                required: AccessLevel::Mod
            })
        );
    }

    #[tokio::test]
    async fn test_granted_role_passes_with_resolved_level() {
        let (gate, store) = gate();
        store.add_role(9, 50, AccessLevel::Mod).await.unwrap();

        let decision = gate.check(&mute_def(), "mute", &invocation(2, Some(9))).await.unwrap();
        assert_eq!(decision, GateDecision::Pass(AccessLevel::Mod));
    }

    #[tokio::test]
    async fn test_global_owner_passes_anywhere() {
        let (gate, _) = gate();
        let decision = gate
            .check(&mute_def(), "mute", &invocation(GLOBAL_OWNER, Some(9)))
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Pass(AccessLevel::Owner));
    }

    #[tokio::test]
    async fn test_rejected_invocation_does_not_start_the_cooldown() {
        let (gate, store) = gate();
        let def = mute_def();

        // Below the required level: rejected, and no timer may start.
        let decision = gate.check(&def, "mute", &invocation(2, Some(9))).await.unwrap();
        assert!(matches!(decision, GateDecision::Reject(_)));

        // Grant access and retry immediately; a leaked timer would reject.
        store.add_role(9, 50, AccessLevel::Mod).await.unwrap();
        let decision = gate.check(&def, "mute", &invocation(2, Some(9))).await.unwrap();
        assert_eq!(decision, GateDecision::Pass(AccessLevel::Mod));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_use_within_cooldown_rejected_with_remaining() {
        let (gate, store) = gate();
        store.add_role(9, 50, AccessLevel::Mod).await.unwrap();
        let def = mute_def();

        let first = gate.check(&def, "mute", &invocation(2, Some(9))).await.unwrap();
        assert!(matches!(first, GateDecision::Pass(_)));

        tokio::time::advance(Duration::from_secs(3)).await;
        let second = gate.check(&def, "mute", &invocation(2, Some(9))).await.unwrap();
        assert_eq!(
            second,
            GateDecision::Reject(Rejection::Cooldown {
                remaining: Duration::from_secs(7),
            })
        );
    }
}
