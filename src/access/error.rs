//! Access store error types.

use thiserror::Error;

/// Failure talking to or mutating the grant store.
///
/// Always recoverable by the caller: the dispatch path reports it as a
/// single database-error response and carries on.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Underlying storage failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A grant insert collided with an existing row for the same subject.
    #[error("grant already exists for id {0}")]
    DuplicateGrant(i64),
}

impl AccessError {
    /// Whether the failure is a duplicate-grant conflict rather than an
    /// infrastructure problem.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateGrant(_))
    }
}
