//! Database models for the access grant relations.

use serde::Serialize;
use sqlx::FromRow;

/// Role grant row: members holding the role get the level.
///
/// `role_id` is the primary key; platform role ids are snowflakes and
/// globally unique, so removal keys on the role alone.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct RoleGrant {
    pub guild_id: i64,
    pub role_id: i64,
    /// Stored rank; decoded through `AccessLevel::from_rank`.
    pub level: i16,
}

/// Operator grant row: a per-user elevation, fixed at the operator tier.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct OperatorGrant {
    pub guild_id: i64,
    pub user_id: i64,
    /// Stored rank; persisted for forward compatibility, currently always
    /// the operator rank.
    pub level: i16,
}
