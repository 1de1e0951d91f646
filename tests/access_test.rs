//! Integration tests for the cached access store and level resolution.
//!
//! Covers the invalidate-on-write discipline (no stale reads after an
//! acknowledged mutation), result caching including empty results, the
//! evicted-on-failure behavior for broken storage, and effective-level
//! resolution with the owner overrides.
//!
//! Run with: `cargo test --test access_test`

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::{self, BoxFuture};

use warden_core::access::{
    AccessError, AccessLevel, AccessStore, GrantStore, MemoryGrantStore, resolve_member_level,
};

/// Backend wrapper counting guild-wide reads so cache hits and misses are
/// observable from outside, with a switch to make writes fail.
struct CountingStore {
    inner: MemoryGrantStore,
    role_reads: AtomicUsize,
    operator_reads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryGrantStore::new(),
            role_reads: AtomicUsize::new(0),
            operator_reads: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn role_reads(&self) -> usize {
        self.role_reads.load(Ordering::SeqCst)
    }

    fn operator_reads(&self) -> usize {
        self.operator_reads.load(Ordering::SeqCst)
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_error(&self) -> Option<BoxFuture<'_, Result<(), AccessError>>> {
        self.fail_writes.load(Ordering::SeqCst).then(|| {
            Box::pin(future::ready(Err(AccessError::Database(
                sqlx::Error::PoolTimedOut,
            )))) as BoxFuture<'_, _>
        })
    }
}

impl GrantStore for CountingStore {
    fn insert_role(
        &self,
        guild_id: i64,
        role_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        if let Some(err) = self.write_error() {
            return err;
        }
        self.inner.insert_role(guild_id, role_id, level)
    }

    fn insert_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        if let Some(err) = self.write_error() {
            return err;
        }
        self.inner.insert_operator(guild_id, user_id)
    }

    fn delete_role(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        self.inner.delete_role(role_id)
    }

    fn delete_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<bool, AccessError>> {
        self.inner.delete_operator(guild_id, user_id)
    }

    fn delete_guild(&self, guild_id: i64) -> BoxFuture<'_, Result<(), AccessError>> {
        self.inner.delete_guild(guild_id)
    }

    fn role_levels(
        &self,
        guild_id: i64,
    ) -> BoxFuture<'_, Result<HashMap<i64, AccessLevel>, AccessError>> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.role_levels(guild_id)
    }

    fn operator_ids(&self, guild_id: i64) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        self.operator_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.operator_ids(guild_id)
    }

    fn role_level(&self, role_id: i64) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        self.inner.role_level(role_id)
    }

    fn operator_level(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        self.inner.operator_level(guild_id, user_id)
    }

    fn roles_with_level(
        &self,
        guild_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        self.inner.roles_with_level(guild_id, level)
    }

    fn role_exists(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        self.inner.role_exists(role_id)
    }
}

fn store_with_backend() -> (AccessStore, Arc<CountingStore>) {
    let backend = Arc::new(CountingStore::new());
    let store = AccessStore::new(Arc::clone(&backend) as Arc<dyn GrantStore>, 16);
    (store, backend)
}

// ============================================================================
// Point Lookups
// ============================================================================

/// Adding a role grant is immediately visible through the uncached point
/// lookup; removing it restores the lowest-tier default.
#[tokio::test]
async fn test_role_grant_add_then_remove_round_trip() {
    let (store, _) = store_with_backend();

    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();
    assert_eq!(store.role_level(50).await.unwrap(), AccessLevel::Mod);
    assert!(store.is_access_role(50).await.unwrap());

    assert!(store.remove_role(1, 50).await.unwrap());
    assert_eq!(store.role_level(50).await.unwrap(), AccessLevel::All);
    assert!(!store.is_access_role(50).await.unwrap());
}

#[tokio::test]
async fn test_roles_with_level_filters_exactly() {
    let (store, _) = store_with_backend();
    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();
    store.add_role(1, 51, AccessLevel::Admin).await.unwrap();

    assert_eq!(
        store.roles_with_level(1, AccessLevel::Mod).await.unwrap(),
        vec![50]
    );
    assert!(
        store
            .roles_with_level(1, AccessLevel::Owner)
            .await
            .unwrap()
            .is_empty()
    );
}

// ============================================================================
// Caching Discipline
// ============================================================================

/// Repeated guild-wide reads serve from cache; only the first one reaches
/// the backend.
#[tokio::test]
async fn test_guild_reads_are_cached() {
    let (store, backend) = store_with_backend();
    backend.inner.insert_role(1, 50, AccessLevel::Mod).await.unwrap();

    for _ in 0..3 {
        let roles = store.all_roles(1).await.unwrap();
        assert_eq!(roles.get(&50), Some(&AccessLevel::Mod));
    }
    assert_eq!(backend.role_reads(), 1, "second and third reads must be cache hits");

    for _ in 0..3 {
        store.operators(1).await.unwrap();
    }
    assert_eq!(backend.operator_reads(), 1);
}

/// Empty results are cached too, so a guild with no grants does not hit the
/// backend on every gate check.
#[tokio::test]
async fn test_empty_results_are_cached() {
    let (store, backend) = store_with_backend();

    assert!(store.all_roles(77).await.unwrap().is_empty());
    assert!(store.all_roles(77).await.unwrap().is_empty());

    assert_eq!(backend.role_reads(), 1, "empty result must be cached");
}

/// After an acknowledged mutation, the next read for that guild reflects it.
/// No stale-cache window.
#[tokio::test]
async fn test_mutation_is_visible_to_the_next_read() {
    let (store, backend) = store_with_backend();

    // Warm the cache with the pre-write state.
    assert!(store.all_roles(1).await.unwrap().is_empty());

    store.add_role(1, 50, AccessLevel::Admin).await.unwrap();

    let roles = store.all_roles(1).await.unwrap();
    assert_eq!(roles.get(&50), Some(&AccessLevel::Admin));
    assert_eq!(backend.role_reads(), 2, "mutation must evict the cached entry");

    store.remove_role(1, 50).await.unwrap();
    assert!(store.all_roles(1).await.unwrap().is_empty());
}

/// Invalidation is keyed per guild: mutating one guild leaves another
/// guild's cached entry alone.
#[tokio::test]
async fn test_mutation_does_not_evict_other_guilds() {
    let (store, backend) = store_with_backend();

    store.all_roles(1).await.unwrap();
    store.all_roles(2).await.unwrap();
    assert_eq!(backend.role_reads(), 2);

    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();

    store.all_roles(2).await.unwrap();
    assert_eq!(backend.role_reads(), 2, "guild 2 must still be served from cache");
}

/// The operator list cache follows the same discipline as the role cache.
#[tokio::test]
async fn test_operator_mutations_invalidate_the_operator_cache() {
    let (store, _) = store_with_backend();

    assert!(!store.is_operator(1, 7).await.unwrap());

    store.add_operator(1, 7).await.unwrap();
    assert!(store.is_operator(1, 7).await.unwrap());
    assert_eq!(
        store.operator_level(1, 7).await.unwrap(),
        Some(AccessLevel::Operator)
    );

    assert!(store.remove_operator(1, 7).await.unwrap());
    assert!(!store.is_operator(1, 7).await.unwrap());
    assert_eq!(store.operator_level(1, 7).await.unwrap(), None);
}

/// A failed write leaves the guild's cache entry evicted: the error reaches
/// the caller and the next read goes back to the backend instead of serving
/// a possibly stale value.
#[tokio::test]
async fn test_failed_write_leaves_cache_evicted() {
    let (store, backend) = store_with_backend();
    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();
    store.all_roles(1).await.unwrap();
    let reads_before = backend.role_reads();

    backend.set_fail_writes(true);
    let err = store.add_role(1, 60, AccessLevel::Admin).await.unwrap_err();
    assert!(matches!(err, AccessError::Database(_)));
    backend.set_fail_writes(false);

    let roles = store.all_roles(1).await.unwrap();
    assert_eq!(backend.role_reads(), reads_before + 1, "read after failed write must miss");
    assert_eq!(roles.get(&50), Some(&AccessLevel::Mod));
    assert_eq!(roles.get(&60), None, "failed write must not be observable");
}

/// `clear_guild` wipes both relations and both cache entries for the guild,
/// leaving other guilds untouched.
#[tokio::test]
async fn test_clear_guild_wipes_grants_and_caches() {
    let (store, _) = store_with_backend();
    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();
    store.add_operator(1, 7).await.unwrap();
    store.add_role(2, 60, AccessLevel::Admin).await.unwrap();

    // Warm both caches.
    store.all_roles(1).await.unwrap();
    store.operators(1).await.unwrap();

    store.clear_guild(1).await.unwrap();

    assert!(store.all_roles(1).await.unwrap().is_empty());
    assert!(store.operators(1).await.unwrap().is_empty());
    assert_eq!(
        store.all_roles(2).await.unwrap().get(&60),
        Some(&AccessLevel::Admin)
    );
}

// ============================================================================
// Effective Level Resolution
// ============================================================================

const GLOBAL_OWNER: i64 = 999;

/// A member holding roles granted Mod and Admin resolves to the higher of
/// the two.
#[tokio::test]
async fn test_highest_role_grant_wins() {
    let (store, _) = store_with_backend();
    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();
    store.add_role(1, 51, AccessLevel::Admin).await.unwrap();

    let level = resolve_member_level(&store, GLOBAL_OWNER, Some(1), Some(111), 2, &[50, 51])
        .await
        .unwrap();
    assert_eq!(level, AccessLevel::Admin);
}

/// The guild owner resolves to Owner no matter what the stored grants say.
#[tokio::test]
async fn test_guild_owner_override() {
    let (store, _) = store_with_backend();
    store.add_role(1, 50, AccessLevel::Mod).await.unwrap();

    let level = resolve_member_level(&store, GLOBAL_OWNER, Some(1), Some(111), 111, &[50])
        .await
        .unwrap();
    assert_eq!(level, AccessLevel::Owner);
}

/// The bot's configured global owner resolves to Owner in any guild, and
/// even outside one.
#[tokio::test]
async fn test_global_owner_override() {
    let (store, _) = store_with_backend();

    for guild in [Some(1), Some(2), None] {
        let level = resolve_member_level(&store, GLOBAL_OWNER, guild, Some(111), GLOBAL_OWNER, &[])
            .await
            .unwrap();
        assert_eq!(level, AccessLevel::Owner, "guild {guild:?}");
    }
}

/// An operator grant raises a member with no role grants to Operator; role
/// grants above it still win.
#[tokio::test]
async fn test_operator_grant_raises_level() {
    let (store, _) = store_with_backend();
    store.add_operator(1, 7).await.unwrap();

    let level = resolve_member_level(&store, GLOBAL_OWNER, Some(1), Some(111), 7, &[])
        .await
        .unwrap();
    assert_eq!(level, AccessLevel::Operator);

    store.add_role(1, 50, AccessLevel::Admin).await.unwrap();
    let level = resolve_member_level(&store, GLOBAL_OWNER, Some(1), Some(111), 7, &[50])
        .await
        .unwrap();
    assert_eq!(level, AccessLevel::Admin);
}

/// Outside a guild a regular member resolves to the open tier.
#[tokio::test]
async fn test_direct_messages_resolve_to_all() {
    let (store, _) = store_with_backend();

    let level = resolve_member_level(&store, GLOBAL_OWNER, None, None, 7, &[])
        .await
        .unwrap();
    assert_eq!(level, AccessLevel::All);
}
