//! Command registry errors.

use thiserror::Error;

/// Raised while building or registering command definitions. These are
/// programming errors in the command table, surfaced at startup rather than
/// at dispatch time.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command name {0:?}: 1-32 chars of a-z, 0-9, '-' or '_'")]
    InvalidName(String),
    #[error("duplicate command name {0:?} at the same tree level")]
    DuplicateName(String),
}
