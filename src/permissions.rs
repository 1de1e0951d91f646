//! Channel-level bot permissions using bitflags.
//!
//! Represents the effective permissions the bot holds in the channel a
//! command was invoked from, as reported by the platform gateway. Command
//! definitions declare the subset they require; the gate rejects when the
//! declared set is not contained in the effective set.
//!
//! Permissions are organized into categories:
//! - Messaging (bits 0-4): replying and message management
//! - Members (bits 5-9): moderation actions on members
//! - Guild (bits 10-12): administrative surfaces commands may touch

use bitflags::bitflags;

bitflags! {
    /// Bot permissions in a channel as a 64-bit bitfield.
    ///
    /// Stored and transported as BIGINT; unknown bits from newer platform
    /// versions are dropped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct ChannelPermissions: u64 {
        // === Messaging (bits 0-4) ===
        /// View the channel and read its history
        const VIEW_CHANNEL     = 1 << 0;
        /// Send messages in the channel
        const SEND_MESSAGES    = 1 << 1;
        /// Embed rich content in replies
        const EMBED_LINKS      = 1 << 2;
        /// Attach files to replies
        const ATTACH_FILES     = 1 << 3;
        /// Delete or pin other members' messages
        const MANAGE_MESSAGES  = 1 << 4;

        // === Members (bits 5-9) ===
        /// Time out members (platform-native mute)
        const MODERATE_MEMBERS = 1 << 5;
        /// Kick members from the guild
        const KICK_MEMBERS     = 1 << 6;
        /// Ban members from the guild
        const BAN_MEMBERS      = 1 << 7;
        /// Mute members in voice channels
        const MUTE_MEMBERS     = 1 << 8;
        /// Move members between voice channels
        const MOVE_MEMBERS     = 1 << 9;

        // === Guild (bits 10-12) ===
        /// Create, edit, and assign roles below the bot's own
        const MANAGE_ROLES     = 1 << 10;
        /// Create, edit, and delete channels
        const MANAGE_CHANNELS  = 1 << 11;
        /// Read the guild audit log
        const VIEW_AUDIT_LOG   = 1 << 12;
    }
}

impl ChannelPermissions {
    // === Database / Gateway Conversion ===

    /// Create permissions from a BIGINT value.
    ///
    /// Reinterprets the i64 bit pattern as u64; unknown bits are silently
    /// ignored to stay forward compatible with newer platform permissions.
    #[must_use]
    pub const fn from_db(value: i64) -> Self {
        let bits = value as u64;
        Self::from_bits_truncate(bits)
    }

    /// Convert permissions to a BIGINT value.
    #[must_use]
    pub const fn to_db(self) -> i64 {
        self.bits() as i64
    }

    // === Permission Checking ===

    /// Check if this permission set includes the specified permission(s).
    #[must_use]
    pub const fn has(self, permission: Self) -> bool {
        self.contains(permission)
    }

    /// The declared permissions absent from `effective`. Empty when the
    /// bot holds everything this set requires.
    #[must_use]
    pub const fn missing_from(self, effective: Self) -> Self {
        self.difference(effective)
    }

    /// Flag names of this set, for logs and rejection details.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for ChannelPermissions {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for ChannelPermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}
