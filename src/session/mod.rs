//! Conversation controller.
//!
//! A [`ChatSession`] wires user actions to the history store, the provider
//! backend and a [`ChatView`]. It owns the store and keeps only the id of the
//! current conversation as its cursor.

pub mod view;

pub use view::{ChatView, NullView};

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::credential::{Credential, CredentialPrompt, CredentialStore, SessionMode};
use crate::error::{DispatchError, Result};
use crate::history::{HistoryEntry, HistoryStore};
use crate::provider::{ChatBackend, ChatRequest, Dispatcher};
use crate::share;
use crate::storage::{FileKeyValueStore, KeyValueStore};
use crate::types::{BotConfig, ConversationId, Message, Sender};

/// Transcript text recorded when a provider call fails, whatever the cause.
pub const DISPATCH_ERROR_TEXT: &str = "Error: Check your API key.";
/// Label of the failure entry.
pub const SYSTEM_NAME: &str = "System";
pub const ERROR_COLOR: &str = "#aa0000";
/// Shown when a share parameter cannot be decoded.
pub const LINK_ERROR_ALERT: &str = "Link Error!";
/// Label for replies when the bot name is blank.
pub const FALLBACK_BOT_NAME: &str = "AI";

/// Everything a session is assembled from.
pub struct SessionParts {
    pub history: HistoryStore,
    pub credentials: CredentialStore,
    pub backend: Arc<dyn ChatBackend>,
    pub user_name: String,
    pub share_base_url: String,
}

impl SessionParts {
    /// File-backed stores under `config.data_dir` and the HTTP dispatcher.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir));
        let history = HistoryStore::load_or_recover(backend.clone())?
            .with_max_conversations(config.max_conversations);
        let dispatcher = Dispatcher::new(config.endpoints.clone(), config.timeout)?;
        Ok(Self {
            history,
            credentials: CredentialStore::new(backend),
            backend: Arc::new(dispatcher),
            user_name: config.user_name.clone(),
            share_base_url: config.share_base_url.clone(),
        })
    }
}

/// How a send ended.
#[derive(Debug)]
pub enum SendOutcome {
    Replied(String),
    /// The call failed; the transcript holds [`DISPATCH_ERROR_TEXT`].
    Failed(DispatchError),
}

pub struct ChatSession {
    history: HistoryStore,
    credentials: CredentialStore,
    backend: Arc<dyn ChatBackend>,
    user_name: String,
    share_base_url: String,
    bot: BotConfig,
    credential: Option<Credential>,
    current: ConversationId,
    mode: SessionMode,
}

impl ChatSession {
    /// Start a session, optionally from a share parameter.
    ///
    /// A decodable parameter opens a guided session with the shared persona
    /// and the shared-link credential (prompting for it once). An undecodable
    /// one raises [`LINK_ERROR_ALERT`] and falls back to a manual session with
    /// default settings and the last-used credential.
    pub fn open(
        parts: SessionParts,
        share_param: Option<&str>,
        prompt: &mut dyn CredentialPrompt,
        view: &mut dyn ChatView,
    ) -> Result<Self> {
        let SessionParts {
            mut history,
            credentials,
            backend,
            user_name,
            share_base_url,
        } = parts;

        let (mode, bot) = match share_param.map(share::decode) {
            Some(Ok(bot)) => (SessionMode::Guided, bot),
            Some(Err(err)) => {
                warn!(error = %err, "ignoring undecodable share parameter");
                view.alert(LINK_ERROR_ALERT);
                (SessionMode::Manual, BotConfig::default())
            }
            None => (SessionMode::Manual, BotConfig::default()),
        };
        let credential = credentials.resolve(mode, prompt)?;
        let current = history.new_conversation();
        info!(?mode, model = %bot.model, has_credential = credential.is_some(), "session opened");

        let session = Self {
            history,
            credentials,
            backend,
            user_name,
            share_base_url,
            bot,
            credential,
            current,
            mode,
        };
        session.refresh_history(view);
        Ok(session)
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn bot(&self) -> &BotConfig {
        &self.bot
    }

    pub fn current(&self) -> ConversationId {
        self.current
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Replace the session key. Blank input clears it.
    pub fn set_credential(&mut self, raw: &str) {
        self.credential = Credential::new(raw);
    }

    /// Messages of the current conversation; empty until its first send.
    pub fn transcript(&self) -> &[Message] {
        self.history
            .get(self.current)
            .map(|c| c.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.history.list(Some(self.current))
    }

    /// Send one user turn and record the reply.
    ///
    /// Returns `Ok(None)` without touching anything when the text or the
    /// credential is empty. Otherwise both outcomes append an `ai` message,
    /// so the transcript also records failures.
    pub async fn send(
        &mut self,
        text: &str,
        view: &mut dyn ChatView,
    ) -> Result<Option<SendOutcome>> {
        let text = text.trim();
        let Some(credential) = self.credential.clone() else {
            debug!("send ignored: no credential");
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(None);
        }

        self.credentials.remember_last_used(&credential)?;
        self.record(Sender::User, text, self.user_name.clone(), view)?;

        view.show_composing(&self.bot.color_ai);
        let request = ChatRequest::new(&self.bot.model, &self.bot.persona, text);
        let result = self.backend.send(&request, &credential).await;
        view.hide_composing();

        let outcome = match result {
            Ok(reply) => {
                self.record(Sender::Ai, &reply, self.bot_label(), view)?;
                SendOutcome::Replied(reply)
            }
            Err(err) => {
                self.history
                    .append(self.current, Sender::Ai, DISPATCH_ERROR_TEXT, SYSTEM_NAME)?;
                let failure = Message::ai(DISPATCH_ERROR_TEXT, SYSTEM_NAME);
                view.show_message(&failure, self.color_of(&failure));
                self.refresh_history(view);
                SendOutcome::Failed(err)
            }
        };
        Ok(Some(outcome))
    }

    /// Make `id` current and re-render its transcript.
    pub fn switch(&mut self, id: ConversationId, view: &mut dyn ChatView) -> Result<()> {
        let conversation = self.history.get(id)?;
        view.clear();
        for message in &conversation.messages {
            view.show_message(message, self.color_of(message));
        }
        self.current = id;
        self.refresh_history(view);
        Ok(())
    }

    /// Point the cursor at a fresh, not yet persisted conversation.
    pub fn new_conversation(&mut self, view: &mut dyn ChatView) -> ConversationId {
        self.current = self.history.new_conversation();
        view.clear();
        self.refresh_history(view);
        self.current
    }

    /// Adopt `bot` as the session configuration and return its share link.
    ///
    /// The current credential, if any, becomes the last-used one.
    pub fn save_config(&mut self, bot: BotConfig) -> Result<String> {
        if let Some(ref credential) = self.credential {
            self.credentials.remember_last_used(credential)?;
        }
        let link = share::share_link(&self.share_base_url, &bot)?;
        self.bot = bot;
        info!(model = %self.bot.model, "configuration saved");
        Ok(link)
    }

    /// Share link for the configuration in use.
    pub fn share_link(&self) -> Result<String> {
        share::share_link(&self.share_base_url, &self.bot)
    }

    /// Post an image file into the current conversation as an inline
    /// `data:` URI. No credential is needed and nothing is uploaded.
    pub fn attach_image(&mut self, path: &Path, view: &mut dyn ChatView) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let text = format!("![{label}]({})", data_uri(mime_for(path), &bytes));
        debug!(path = %path.display(), size = bytes.len(), "attaching image");
        self.record(Sender::User, &text, self.user_name.clone(), view)
    }

    fn record(
        &mut self,
        sender: Sender,
        text: &str,
        name: String,
        view: &mut dyn ChatView,
    ) -> Result<()> {
        self.history.append(self.current, sender, text, name.clone())?;
        let message = Message::new(sender, text, name);
        view.show_message(&message, self.color_of(&message));
        self.refresh_history(view);
        Ok(())
    }

    fn bot_label(&self) -> String {
        let name = self.bot.name.trim();
        if name.is_empty() {
            FALLBACK_BOT_NAME.to_string()
        } else {
            name.to_string()
        }
    }

    /// Stored dispatch failures keep the error color on every re-render.
    fn color_of(&self, message: &Message) -> &str {
        match message.sender {
            Sender::User => &self.bot.color_user,
            Sender::Ai if is_dispatch_failure(message) => ERROR_COLOR,
            Sender::Ai => &self.bot.color_ai,
        }
    }

    fn refresh_history(&self, view: &mut dyn ChatView) {
        if self.mode == SessionMode::Manual {
            view.show_history(&self.history_entries());
        }
    }
}

fn is_dispatch_failure(message: &Message) -> bool {
    message.sender == Sender::Ai && message.name == SYSTEM_NAME && message.text == DISPATCH_ERROR_TEXT
}

/// Content type guessed from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
