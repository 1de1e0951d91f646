//! Cached access grant store.
//!
//! Wraps a [`GrantStore`] backend with two bounded guild-keyed caches: role
//! maps and operator lists. Mutations evict the guild's cache entry before
//! the write is issued, so a failed write leaves the entry absent and the
//! next read goes back to the backend. Per-guild generation counters prevent
//! an in-flight read of pre-write state from re-caching stale data after the
//! write completes (TOCTOU protection) without causing cross-guild misses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tracing::{info, instrument};

use super::backend::GrantStore;
use super::error::AccessError;
use super::level::AccessLevel;
use crate::cache::FixedCache;

/// Guild-keyed bounded cache guarded by per-guild generation counters.
struct GuardedCache<V> {
    entries: RwLock<FixedCache<i64, V>>,
    /// Incremented on invalidation so in-flight loads from stale data are
    /// discarded on insert.
    generations: DashMap<i64, Arc<AtomicU64>>,
}

impl<V: Clone> GuardedCache<V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(FixedCache::new(capacity)),
            generations: DashMap::new(),
        }
    }

    /// Get or create the generation counter for a guild.
    fn guild_generation(&self, guild_id: i64) -> Arc<AtomicU64> {
        self.generations
            .entry(guild_id)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    fn generation(&self, guild_id: i64) -> u64 {
        self.guild_generation(guild_id).load(Ordering::Acquire)
    }

    fn get(&self, guild_id: i64) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guild_id)
            .cloned()
    }

    /// Insert only if no invalidation happened for this guild since
    /// `gen_before` was captured.
    fn insert_if_current(&self, guild_id: i64, value: V, gen_before: u64) {
        if self.generation(guild_id) == gen_before {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .put(guild_id, value);
        }
    }

    /// Evict the guild's entry and bump its generation counter.
    fn invalidate(&self, guild_id: i64) {
        self.guild_generation(guild_id)
            .fetch_add(1, Ordering::Release);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pull(&guild_id);
    }
}

/// Durable role/operator grants behind bounded invalidate-on-write caches.
///
/// Cheap to clone; clones share the backend and caches.
#[derive(Clone)]
pub struct AccessStore {
    backend: Arc<dyn GrantStore>,
    roles: Arc<GuardedCache<Arc<HashMap<i64, AccessLevel>>>>,
    operators: Arc<GuardedCache<Arc<Vec<i64>>>>,
}

impl AccessStore {
    /// Create a store over `backend` with two caches of `cache_capacity`
    /// guild entries each.
    #[must_use]
    pub fn new(backend: Arc<dyn GrantStore>, cache_capacity: usize) -> Self {
        Self {
            backend,
            roles: Arc::new(GuardedCache::new(cache_capacity)),
            operators: Arc::new(GuardedCache::new(cache_capacity)),
        }
    }

    // === Cached Reads ===

    /// All role grants for a guild as `role_id -> level`.
    ///
    /// Cached per guild, empty results included, so absent guilds do not
    /// re-query the backend on every gate check.
    #[instrument(skip(self))]
    pub async fn all_roles(
        &self,
        guild_id: i64,
    ) -> Result<Arc<HashMap<i64, AccessLevel>>, AccessError> {
        // Fast path: cached result.
        if let Some(cached) = self.roles.get(guild_id) {
            return Ok(cached);
        }

        // Capture the generation before the backend read.
        let gen_before = self.roles.generation(guild_id);

        let data = Arc::new(self.backend.role_levels(guild_id).await?);

        self.roles
            .insert_if_current(guild_id, Arc::clone(&data), gen_before);

        Ok(data)
    }

    /// User ids holding an operator grant in the guild. Cached per guild.
    #[instrument(skip(self))]
    pub async fn operators(&self, guild_id: i64) -> Result<Arc<Vec<i64>>, AccessError> {
        if let Some(cached) = self.operators.get(guild_id) {
            return Ok(cached);
        }

        let gen_before = self.operators.generation(guild_id);

        let data = Arc::new(self.backend.operator_ids(guild_id).await?);

        self.operators
            .insert_if_current(guild_id, Arc::clone(&data), gen_before);

        Ok(data)
    }

    /// Whether the user holds an operator grant, via the cached list.
    pub async fn is_operator(&self, guild_id: i64, user_id: i64) -> Result<bool, AccessError> {
        Ok(self.operators(guild_id).await?.contains(&user_id))
    }

    // === Uncached Point Lookups ===

    /// Level granted through a role; no grant means the lowest tier.
    pub async fn role_level(&self, role_id: i64) -> Result<AccessLevel, AccessError> {
        Ok(self
            .backend
            .role_level(role_id)
            .await?
            .unwrap_or(AccessLevel::All))
    }

    /// Level stored on a user's operator grant, if any.
    pub async fn operator_level(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Option<AccessLevel>, AccessError> {
        self.backend.operator_level(guild_id, user_id).await
    }

    /// Role ids granted exactly `level` in the guild.
    pub async fn roles_with_level(
        &self,
        guild_id: i64,
        level: AccessLevel,
    ) -> Result<Vec<i64>, AccessError> {
        self.backend.roles_with_level(guild_id, level).await
    }

    /// Whether any guild has a grant for this role.
    pub async fn is_access_role(&self, role_id: i64) -> Result<bool, AccessError> {
        self.backend.role_exists(role_id).await
    }

    // === Mutations ===
    //
    // Every mutation evicts the guild's cache entry first. On success the
    // entry is invalidated a second time so an in-flight load of pre-write
    // state cannot re-cache it now that the write is visible; on failure the
    // first eviction already left the entry absent.

    /// Grant `level` to members of a role.
    pub async fn add_role(
        &self,
        guild_id: i64,
        role_id: i64,
        level: AccessLevel,
    ) -> Result<(), AccessError> {
        self.roles.invalidate(guild_id);
        self.backend.insert_role(guild_id, role_id, level).await?;
        self.roles.invalidate(guild_id);
        info!(guild_id, role_id, level = level.as_str(), "role access grant added");
        Ok(())
    }

    /// Remove a role's grant. Returns whether a grant existed.
    pub async fn remove_role(&self, guild_id: i64, role_id: i64) -> Result<bool, AccessError> {
        self.roles.invalidate(guild_id);
        let removed = self.backend.delete_role(role_id).await?;
        self.roles.invalidate(guild_id);
        info!(guild_id, role_id, removed, "role access grant removed");
        Ok(removed)
    }

    /// Grant operator access to a user.
    pub async fn add_operator(&self, guild_id: i64, user_id: i64) -> Result<(), AccessError> {
        self.operators.invalidate(guild_id);
        self.backend.insert_operator(guild_id, user_id).await?;
        self.operators.invalidate(guild_id);
        info!(guild_id, user_id, "operator grant added");
        Ok(())
    }

    /// Remove a user's operator grant. Returns whether a grant existed.
    pub async fn remove_operator(&self, guild_id: i64, user_id: i64) -> Result<bool, AccessError> {
        self.operators.invalidate(guild_id);
        let removed = self.backend.delete_operator(guild_id, user_id).await?;
        self.operators.invalidate(guild_id);
        info!(guild_id, user_id, removed, "operator grant removed");
        Ok(removed)
    }

    /// Remove every grant for a guild, both relations.
    pub async fn clear_guild(&self, guild_id: i64) -> Result<(), AccessError> {
        self.roles.invalidate(guild_id);
        self.operators.invalidate(guild_id);
        self.backend.delete_guild(guild_id).await?;
        self.roles.invalidate(guild_id);
        self.operators.invalidate(guild_id);
        info!(guild_id, "all access grants cleared for guild");
        Ok(())
    }
}
