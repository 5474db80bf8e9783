//! Conversation records and their identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::message::Message;

/// Characters of the first message kept in a conversation title.
pub const TITLE_CHARS: usize = 30;

/// Marker appended to every derived title.
pub const TITLE_ELLIPSIS: &str = "...";

/// Timestamp-derived conversation key (Unix milliseconds).
///
/// Persisted as a decimal string so stored maps stay keyed by text. Ordering
/// is numeric, which is also creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(u64);

impl ConversationId {
    /// Largest id accepted from storage (the `i64` millisecond range).
    pub const MAX_MILLIS: u64 = i64::MAX as u64;

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// The id immediately after this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let id: Self = raw.parse().map_err(serde::de::Error::custom)?;
        if id.0 > Self::MAX_MILLIS {
            return Err(serde::de::Error::custom(format!(
                "conversation id {raw} is out of range"
            )));
        }
        Ok(id)
    }
}

/// A titled, append-only sequence of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Start an empty conversation titled after its first message.
    pub fn titled_from(first_text: &str) -> Self {
        Self {
            title: derive_title(first_text),
            messages: Vec::new(),
        }
    }
}

/// First [`TITLE_CHARS`] characters of `text` followed by [`TITLE_ELLIPSIS`].
pub fn derive_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_CHARS).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}
