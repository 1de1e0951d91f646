//! `PostgreSQL` grant storage.
//!
//! Runtime-checked queries over the two relations created by
//! `migrations/0001_access_grants.sql`.

use std::collections::HashMap;

use futures::future::BoxFuture;
use sqlx::PgPool;
use tracing::warn;

use super::backend::GrantStore;
use super::error::AccessError;
use super::level::AccessLevel;
use super::models::RoleGrant;

/// Grant storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GrantStore for PgGrantStore {
    fn insert_role(
        &self,
        guild_id: i64,
        role_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        Box::pin(insert_role(&self.pool, guild_id, role_id, level))
    }

    fn insert_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<(), AccessError>> {
        Box::pin(insert_operator(&self.pool, guild_id, user_id))
    }

    fn delete_role(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        Box::pin(delete_role(&self.pool, role_id))
    }

    fn delete_operator(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<bool, AccessError>> {
        Box::pin(delete_operator(&self.pool, guild_id, user_id))
    }

    fn delete_guild(&self, guild_id: i64) -> BoxFuture<'_, Result<(), AccessError>> {
        Box::pin(delete_guild(&self.pool, guild_id))
    }

    fn role_levels(
        &self,
        guild_id: i64,
    ) -> BoxFuture<'_, Result<HashMap<i64, AccessLevel>, AccessError>> {
        Box::pin(role_levels(&self.pool, guild_id))
    }

    fn operator_ids(&self, guild_id: i64) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        Box::pin(operator_ids(&self.pool, guild_id))
    }

    fn role_level(&self, role_id: i64) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        Box::pin(role_level(&self.pool, role_id))
    }

    fn operator_level(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<AccessLevel>, AccessError>> {
        Box::pin(operator_level(&self.pool, guild_id, user_id))
    }

    fn roles_with_level(
        &self,
        guild_id: i64,
        level: AccessLevel,
    ) -> BoxFuture<'_, Result<Vec<i64>, AccessError>> {
        Box::pin(roles_with_level(&self.pool, guild_id, level))
    }

    fn role_exists(&self, role_id: i64) -> BoxFuture<'_, Result<bool, AccessError>> {
        Box::pin(role_exists(&self.pool, role_id))
    }
}

// ============================================================================
// Write Queries
// ============================================================================

/// Insert a role grant.
async fn insert_role(
    pool: &PgPool,
    guild_id: i64,
    role_id: i64,
    level: AccessLevel,
) -> Result<(), AccessError> {
    sqlx::query("INSERT INTO access_role (guild_id, role_id, level) VALUES ($1, $2, $3)")
        .bind(guild_id)
        .bind(role_id)
        .bind(level.rank())
        .execute(pool)
        .await
        .map_err(|e| map_conflict(e, role_id))?;

    Ok(())
}

/// Insert an operator grant at the operator rank.
async fn insert_operator(pool: &PgPool, guild_id: i64, user_id: i64) -> Result<(), AccessError> {
    sqlx::query("INSERT INTO access_operator (guild_id, user_id, level) VALUES ($1, $2, $3)")
        .bind(guild_id)
        .bind(user_id)
        .bind(AccessLevel::Operator.rank())
        .execute(pool)
        .await
        .map_err(|e| map_conflict(e, user_id))?;

    Ok(())
}

/// Delete a role grant by role id.
///
/// Returns `true` if a grant was removed, `false` if none existed.
async fn delete_role(pool: &PgPool, role_id: i64) -> Result<bool, AccessError> {
    let result = sqlx::query("DELETE FROM access_role WHERE role_id = $1")
        .bind(role_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a user's operator grant.
async fn delete_operator(pool: &PgPool, guild_id: i64, user_id: i64) -> Result<bool, AccessError> {
    let result = sqlx::query("DELETE FROM access_operator WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete all grants for a guild, both relations, atomically.
async fn delete_guild(pool: &PgPool, guild_id: i64) -> Result<(), AccessError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM access_role WHERE guild_id = $1")
        .bind(guild_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM access_operator WHERE guild_id = $1")
        .bind(guild_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// ============================================================================
// Read Queries
// ============================================================================

/// All role grants for a guild as `role_id -> level`.
async fn role_levels(
    pool: &PgPool,
    guild_id: i64,
) -> Result<HashMap<i64, AccessLevel>, AccessError> {
    let rows = sqlx::query_as::<_, RoleGrant>(
        r"
        SELECT guild_id, role_id, level
        FROM access_role
        WHERE guild_id = $1
        ",
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.role_id, decode_level(row.level, row.role_id)))
        .collect())
}

/// User ids holding an operator grant in the guild.
async fn operator_ids(pool: &PgPool, guild_id: i64) -> Result<Vec<i64>, AccessError> {
    let ids = sqlx::query_scalar::<_, i64>(
        r"
        SELECT user_id
        FROM access_operator
        WHERE guild_id = $1 AND level = $2
        ",
    )
    .bind(guild_id)
    .bind(AccessLevel::Operator.rank())
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Level granted through a role, if any.
async fn role_level(pool: &PgPool, role_id: i64) -> Result<Option<AccessLevel>, AccessError> {
    let rank = sqlx::query_scalar::<_, i16>("SELECT level FROM access_role WHERE role_id = $1")
        .bind(role_id)
        .fetch_optional(pool)
        .await?;

    Ok(rank.map(|r| decode_level(r, role_id)))
}

/// Level stored on a user's operator grant, if any.
async fn operator_level(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<AccessLevel>, AccessError> {
    let rank = sqlx::query_scalar::<_, i16>(
        "SELECT level FROM access_operator WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(rank.map(|r| decode_level(r, user_id)))
}

/// Role ids granted exactly `level` in the guild.
async fn roles_with_level(
    pool: &PgPool,
    guild_id: i64,
    level: AccessLevel,
) -> Result<Vec<i64>, AccessError> {
    let ids = sqlx::query_scalar::<_, i64>(
        r"
        SELECT role_id
        FROM access_role
        WHERE guild_id = $1 AND level = $2
        ",
    )
    .bind(guild_id)
    .bind(level.rank())
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Whether any guild has a grant for this role.
async fn role_exists(pool: &PgPool, role_id: i64) -> Result<bool, AccessError> {
    let result: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM access_role WHERE role_id = $1)")
            .bind(role_id)
            .fetch_one(pool)
            .await?;

    Ok(result.0)
}

/// Map a stored rank to a level, degrading unknown ranks to the lowest tier.
///
/// An unknown rank means a corrupt or future-version row; commands must keep
/// working, so the grant counts as `All` and the row is flagged in the log.
fn decode_level(rank: i16, subject_id: i64) -> AccessLevel {
    AccessLevel::from_rank(rank).unwrap_or_else(|| {
        warn!(rank, subject_id, "unknown access level rank in grant row, treating as lowest tier");
        AccessLevel::All
    })
}

/// Surface unique-constraint violations as duplicate grants.
fn map_conflict(err: sqlx::Error, subject_id: i64) -> AccessError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AccessError::DuplicateGrant(subject_id)
        }
        _ => AccessError::Database(err),
    }
}
