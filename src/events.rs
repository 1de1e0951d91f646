//! Gateway-facing interaction events.
//!
//! The embedding bot shell decodes platform traffic into these types and
//! feeds component interactions to the [`crate::correlator::EventCorrelator`].
//! Only the fields usable in wait predicates are carried; rendering payloads
//! stay on the platform side.

use serde::{Deserialize, Serialize};

/// Kinds of follow-up interaction the correlator can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A button on a bot message was clicked.
    Button,
    /// An option was chosen in a select menu on a bot message.
    SelectMenu,
    /// A modal opened by the bot was submitted.
    ModalSubmit,
}

impl EventKind {
    /// String identifier used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::SelectMenu => "select_menu",
            Self::ModalSubmit => "modal_submit",
        }
    }
}

/// A component interaction delivered by the platform gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Interaction kind; waits are bucketed by it.
    pub kind: EventKind,
    /// Developer-assigned id of the component that was used.
    pub component_id: String,
    /// Message the component is attached to.
    pub message_id: i64,
    /// Channel the interaction happened in.
    pub channel_id: i64,
    /// Guild the interaction happened in (`None` for direct messages).
    pub guild_id: Option<i64>,
    /// User who interacted.
    pub user_id: i64,
    /// Selected values (select menus) or submitted fields (modals).
    #[serde(default)]
    pub values: Vec<String>,
}
