//! ikichat: persona chat over Gemini, OpenAI and Groq.
//!
//! A bot is a small [`types::BotConfig`] (name, persona instruction, model id,
//! colors) that can be packed into a share link. Conversations are kept in a
//! local [`history::HistoryStore`], and each user turn is routed to a provider
//! chosen from the model id.
//!
//! # Quick Start
//!
//! ```no_run
//! use ikichat::config::ChatConfig;
//! use ikichat::session::{ChatSession, NullView, SessionParts};
//!
//! # async fn example() -> ikichat::error::Result<()> {
//! let config = ChatConfig::load()?;
//! let parts = SessionParts::from_config(&config)?;
//! let mut no_prompt = |_: &str| -> Option<String> { None };
//! let mut session = ChatSession::open(parts, None, &mut no_prompt, &mut NullView)?;
//! session.set_credential("my-api-key");
//! session.send("Hello", &mut NullView).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod history;
pub mod provider;
pub mod session;
pub mod share;
pub mod storage;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
