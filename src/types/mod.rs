//! Core types: conversations, messages, bot configuration.

pub mod bot;
pub mod conversation;
pub mod message;

pub use bot::BotConfig;
pub use conversation::{Conversation, ConversationId};
pub use message::{Message, Sender};
