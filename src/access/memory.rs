//! In-memory grant storage.
//!
//! Mirrors [`super::PgGrantStore`] behavior over plain maps, including
//! duplicate-grant conflicts. Backs the test suite and embeddings that run
//! without a database.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::{self, BoxFuture};

use super::backend::GrantStore;
use super::error::AccessError;
use super::level::AccessLevel;

#[derive(Debug, Default)]
struct Tables {
    /// role_id -> (guild_id, level)
    roles: HashMap<i64, (i64, AccessLevel)>,
    /// (guild_id, user_id) -> level
    operators: HashMap<(i64, i64), AccessLevel>,
}

/// Grant storage held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    inner: RwLock<Tables>,
}

impl MemoryGrantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GrantStore for MemoryGrantStore {
    fn insert_role(
        &self,
        guild_id: i64,
        role_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        let result = {
            let mut tables = self.write();
            if tables.roles.contains_key(&role_id) {
                Err(AccessError::DuplicateGrant(role_id))
            } else {
                tables.roles.insert(role_id, (guild_id, level));
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn insert_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        let result = {
            let mut tables = self.write();
            if tables.operators.contains_key(&(guild_id, user_id)) {
                Err(AccessError::DuplicateGrant(user_id))
            } else {
                tables
                    .operators
                    .insert((guild_id, user_id), AccessLevel::Operator);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn delete_role(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        let removed = self.write().roles.remove(&role_id).is_some();
        Box::pin(future::ready(Ok(removed)))
    }

    fn delete_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<bool, AccessError>> {
        let removed = self.write().operators.remove(&(guild_id, user_id)).is_some();
        Box::pin(future::ready(Ok(removed)))
    }

    fn delete_guild(&self, guild_id: i64) -> BoxFuture<'_, Result<(), AccessError>> {
        {
            let mut tables = self.write();
            tables.roles.retain(|_, (guild, _)| *guild != guild_id);
            tables.operators.retain(|(guild, _), _| *guild != guild_id);
        }
        Box::pin(future::ready(Ok(())))
    }

    fn role_levels(
        &self,
        guild_id: i64,
    ) -> BoxFuture<'_, Result<HashMap<i64, AccessLevel>, AccessError>> {
        let map = self
            .read()
            .roles
            .iter()
            .filter(|(_, (guild, _))| *guild == guild_id)
            .map(|(role_id, (_, level))| (*role_id, *level))
            .collect();
        Box::pin(future::ready(Ok(map)))
    }

    fn operator_ids(&self, guild_id: i64) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        let ids = self
            .read()
            .operators
            .iter()
            .filter(|((guild, _), level)| *guild == guild_id && **level == AccessLevel::Operator)
            .map(|((_, user_id), _)| *user_id)
            .collect();
        Box::pin(future::ready(Ok(ids)))
    }

    fn role_level(&self, role_id: i64) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        let level = self.read().roles.get(&role_id).map(|(_, level)| *level);
        Box::pin(future::ready(Ok(level)))
    }

    fn operator_level(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        let level = self.read().operators.get(&(guild_id, user_id)).copied();
        Box::pin(future::ready(Ok(level)))
    }

    fn roles_with_level(
        &self,
        guild_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        let ids = self
            .read()
            .roles
            .iter()
            .filter(|(_, (guild, l))| *guild == guild_id && *l == level)
            .map(|(role_id, _)| *role_id)
            .collect();
        Box::pin(future::ready(Ok(ids)))
    }

    fn role_exists(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        let exists = self.read().roles.contains_key(&role_id);
        Box::pin(future::ready(Ok(exists)))
    }
}
