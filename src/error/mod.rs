//! Error types for ikichat.

pub mod dispatch;

pub use dispatch::{DispatchError, ErrorCategory};

use thiserror::Error;

use crate::types::ConversationId;

/// Primary error type for all ikichat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A shared configuration blob could not be decoded.
    #[error("Invalid share link: {0}")]
    Decode(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    /// The persisted history exists but cannot be read back.
    #[error("Conversation history is corrupt: {0}")]
    CorruptHistory(String),

    #[error("Storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Create a storage error for the given key.
    pub fn storage(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Dispatch(err) => err.category(),
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Decode(_) | Self::CorruptHistory(_) | Self::Serialization(_) => {
                ErrorCategory::Serialization
            }
            Self::Storage { .. } | Self::Io(_) => ErrorCategory::Storage,
            Self::NotFound(_) => ErrorCategory::Unknown,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_keep_their_category() {
        let err = ChatError::from(DispatchError::Timeout(5_000));
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert_eq!(err.to_string(), "Dispatch failed: Timeout after 5000ms");
    }

    #[test]
    fn local_failures_have_their_own_categories() {
        let cases = [
            (ChatError::Configuration("bad".into()), ErrorCategory::Configuration),
            (ChatError::Decode("bad".into()), ErrorCategory::Serialization),
            (ChatError::CorruptHistory("bad".into()), ErrorCategory::Serialization),
            (ChatError::storage("k", "disk full"), ErrorCategory::Storage),
            (
                ChatError::NotFound(ConversationId::from_millis(1)),
                ErrorCategory::Unknown,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.category(), expected, "{err}");
        }
    }

    #[test]
    fn not_found_names_the_conversation() {
        let err = ChatError::NotFound(ConversationId::from_millis(1_700_000_000_000));
        assert_eq!(err.to_string(), "Conversation not found: 1700000000000");
    }
}
