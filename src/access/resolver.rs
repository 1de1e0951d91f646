//! Effective access level resolution.
//!
//! A member's level is the maximum of everything that applies: grants on the
//! roles they hold, an operator grant, guild ownership, and global bot
//! ownership. Roles without a grant contribute nothing. The result is never
//! below [`AccessLevel::All`], so resolution cannot deny a command that is
//! open to everyone.

use std::collections::HashMap;

use super::error::AccessError;
use super::level::AccessLevel;
use super::store::AccessStore;

/// Compute the effective level from already-fetched facts.
#[must_use]
pub fn effective_level(
    role_grants: &HashMap<i64, AccessLevel>,
    member_role_ids: &[i64],
    is_operator: bool,
    is_guild_owner: bool,
    is_global_owner: bool,
) -> AccessLevel {
    if is_global_owner || is_guild_owner {
        return AccessLevel::Owner;
    }

    let mut level = AccessLevel::All;
    for role_id in member_role_ids {
        if let Some(granted) = role_grants.get(role_id) {
            level = level.max(*granted);
        }
    }
    if is_operator {
        level = level.max(AccessLevel::Operator);
    }
    level
}

/// Resolve a member's effective level against the store.
///
/// Outside a guild only global ownership can raise the level; everyone else
/// resolves to [`AccessLevel::All`].
pub async fn resolve_member_level(
    store: &AccessStore,
    global_owner_id: i64,
    guild_id: Option<i64>,
    guild_owner_id: Option<i64>,
    user_id: i64,
    member_role_ids: &[i64],
) -> Result<AccessLevel, AccessError> {
    if user_id == global_owner_id {
        return Ok(AccessLevel::Owner);
    }

    let Some(guild_id) = guild_id else {
        return Ok(AccessLevel::All);
    };

    if guild_owner_id == Some(user_id) {
        return Ok(AccessLevel::Owner);
    }

    let role_grants = store.all_roles(guild_id).await?;
    let is_operator = store.is_operator(guild_id, user_id).await?;

    Ok(effective_level(
        &role_grants,
        member_role_ids,
        is_operator,
        false,
        false,
    ))
}
