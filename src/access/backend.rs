//! Grant storage collaborator trait.
//!
//! [`crate::access::AccessStore`] is written against this seam rather than a
//! concrete database so the caching and invalidation discipline can be
//! exercised without infrastructure. [`super::PgGrantStore`] is the
//! production backend; [`super::MemoryGrantStore`] backs tests and
//! storage-less embeddings.

use std::collections::HashMap;

use futures::future::BoxFuture;

use super::error::AccessError;
use super::level::AccessLevel;

/// Durable storage for the two grant relations.
///
/// Object safe: methods return boxed futures so the store can hold
/// `Arc<dyn GrantStore>`. Implementations must not retain interior
/// references to caller data across the returned future.
pub trait GrantStore: Send + Sync {
    /// Insert a role grant. Fails on an existing grant for the role.
    fn insert_role(
        &self,
        guild_id: i64,
        role_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<(), AccessError>>;

    /// Insert an operator grant. Fails on an existing grant for the user.
    fn insert_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<(), AccessError>>;

    /// Delete a role grant by role id alone. Returns whether a row existed.
    fn delete_role(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>>;

    /// Delete a user's operator grant. Returns whether a row existed.
    fn delete_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<bool, AccessError>>;

    /// Delete every grant row for a guild, both relations.
    fn delete_guild(&self, guild_id: i64) -> BoxFuture<'_, Result<(), AccessError>>;

    /// All role grants for a guild as `role_id -> level`.
    fn role_levels(
        &self,
        guild_id: i64,
    ) -> BoxFuture<'_, Result<HashMap<i64, AccessLevel>, AccessError>>;

    /// User ids holding an operator grant in the guild.
    fn operator_ids(&self, guild_id: i64) -> BoxFuture<'_, Result<Vec<i64>, AccessError>>;

    /// Level granted through a role, if any.
    fn role_level(&self, role_id: i64) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>>;

    /// Level stored on a user's operator grant, if any.
    fn operator_level(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>>;

    /// Role ids granted exactly `level` in the guild.
    fn roles_with_level(
        &self,
        guild_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<Vec<i64>, AccessError>>;

    /// Whether any guild has a grant for this role.
    fn role_exists(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>>;
}
