//! Ranked command access tiers.

use serde::{Deserialize, Serialize};

/// Access tier gating command usage, ordered by rank.
///
/// Stored as SMALLINT in `PostgreSQL`; comparison uses the derived ordering,
/// so `Admin > Mod` holds and a member passes a gate iff their effective
/// level is at least the command's declared minimum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Everyone; the default when no grant exists.
    #[default]
    All,
    /// Per-user override, above everyone but below moderators.
    Operator,
    /// Guild moderators.
    Mod,
    /// Guild administrators.
    Admin,
    /// Guild owner and the bot's global owner.
    Owner,
}

impl AccessLevel {
    /// Numeric rank persisted in the grant relations.
    #[must_use]
    pub const fn rank(self) -> i16 {
        match self {
            Self::All => 0,
            Self::Operator => 1,
            Self::Mod => 2,
            Self::Admin => 3,
            Self::Owner => 4,
        }
    }

    /// Map a stored rank back to a level. `None` for unknown ranks; callers
    /// treat that as a data-integrity signal and fall back to [`Self::All`].
    #[must_use]
    pub const fn from_rank(rank: i16) -> Option<Self> {
        match rank {
            0 => Some(Self::All),
            1 => Some(Self::Operator),
            2 => Some(Self::Mod),
            3 => Some(Self::Admin),
            4 => Some(Self::Owner),
            _ => None,
        }
    }

    /// String identifier used in logs and rejection details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Operator => "operator",
            Self::Mod => "mod",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// All tiers in ascending rank order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::All,
            Self::Operator,
            Self::Mod,
            Self::Admin,
            Self::Owner,
        ]
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
