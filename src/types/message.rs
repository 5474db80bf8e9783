//! Transcript messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who produced a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A single transcript entry. Immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    /// Raw text; may hold markdown or an inline image reference.
    pub text: String,
    /// Display label, independent of `sender` so a bot can carry a custom name.
    pub name: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            name: name.into(),
        }
    }

    pub fn user(text: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Sender::User, text, name)
    }

    pub fn ai(text: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text, name)
    }
}
