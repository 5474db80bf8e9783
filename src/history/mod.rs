//! Conversation history store.
//!
//! The store owns the whole `id -> conversation` mapping and writes all of it
//! back through its [`KeyValueStore`] after every append. Mutation goes
//! through `&mut self`, so a read-modify-write never interleaves with another
//! inside one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{ChatError, Result};
use crate::storage::{KeyValueStore, HISTORY_KEY};
use crate::types::{Conversation, ConversationId, Message, Sender};

/// Key that receives an unreadable history payload before it is replaced.
pub const CORRUPT_HISTORY_KEY: &str = "conversation-history.corrupt";

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: ConversationId,
    pub title: String,
    pub active: bool,
}

/// Source of "now" for fresh conversation ids.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    conversations: BTreeMap<ConversationId, Conversation>,
    last_issued: Option<ConversationId>,
    max_conversations: Option<usize>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("conversations", &self.conversations.len())
            .field("last_issued", &self.last_issued)
            .field("max_conversations", &self.max_conversations)
            .finish()
    }
}

impl HistoryStore {
    /// Load the persisted mapping, failing on unreadable data.
    ///
    /// A missing or blank value is an empty history.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let conversations = match backend.get(HISTORY_KEY)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|e| ChatError::CorruptHistory(e.to_string()))?,
            _ => BTreeMap::new(),
        };
        debug!(count = conversations.len(), "loaded conversation history");
        Ok(Self::from_parts(backend, conversations))
    }

    /// Load the persisted mapping, starting empty if it cannot be read.
    ///
    /// An unreadable payload is copied to [`CORRUPT_HISTORY_KEY`] first so the
    /// next append does not destroy it. Only a storage failure while reading
    /// is returned as an error.
    pub fn load_or_recover(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        match Self::load(backend.clone()) {
            Ok(store) => Ok(store),
            Err(ChatError::CorruptHistory(reason)) => {
                warn!(%reason, "conversation history is unreadable, starting empty");
                if let Some(raw) = backend.get(HISTORY_KEY)? {
                    if let Err(err) = backend.set(CORRUPT_HISTORY_KEY, &raw) {
                        warn!(error = %err, "could not back up unreadable history");
                    }
                }
                Ok(Self::from_parts(backend, BTreeMap::new()))
            }
            Err(other) => Err(other),
        }
    }

    fn from_parts(
        backend: Arc<dyn KeyValueStore>,
        conversations: BTreeMap<ConversationId, Conversation>,
    ) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            conversations,
            last_issued: None,
            max_conversations: None,
        }
    }

    /// Replace the clock used by [`HistoryStore::new_conversation`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Keep at most `max` conversations, evicting the oldest on creation.
    /// `None` keeps history unbounded.
    pub fn with_max_conversations(mut self, max: Option<usize>) -> Self {
        self.max_conversations = max.filter(|m| *m > 0);
        self
    }

    /// Append a message, creating the conversation on first use, then
    /// persist the entire mapping.
    pub fn append(
        &mut self,
        id: ConversationId,
        sender: Sender,
        text: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<&Conversation> {
        let message = Message::new(sender, text, name);
        let created = !self.conversations.contains_key(&id);
        if created {
            self.conversations
                .insert(id, Conversation::titled_from(&message.text));
            self.enforce_cap(id);
        }
        if let Some(conversation) = self.conversations.get_mut(&id) {
            conversation.messages.push(message);
        }
        self.persist()?;

        if created {
            info!(%id, "started conversation");
        }
        self.get(id)
    }

    /// Conversations newest first; `active` marks the current one.
    pub fn list(&self, active: Option<ConversationId>) -> Vec<HistoryEntry> {
        self.conversations
            .iter()
            .rev()
            .map(|(id, conversation)| HistoryEntry {
                id: *id,
                title: conversation.title.clone(),
                active: Some(*id) == active,
            })
            .collect()
    }

    pub fn get(&self, id: ConversationId) -> Result<&Conversation> {
        self.conversations.get(&id).ok_or(ChatError::NotFound(id))
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.conversations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Issue a fresh id from the clock.
    ///
    /// Ids are strictly increasing: a clock reading at or below the last
    /// issued or newest stored id is bumped past it. Nothing is persisted
    /// until the first append.
    pub fn new_conversation(&mut self) -> ConversationId {
        let mut id = ConversationId::from_millis(self.clock.now_millis());
        let floor = self
            .last_issued
            .into_iter()
            .chain(self.conversations.keys().next_back().copied())
            .max();
        if let Some(floor) = floor {
            if id <= floor {
                id = floor.next();
            }
        }
        self.last_issued = Some(id);
        id
    }

    fn enforce_cap(&mut self, keep: ConversationId) {
        let Some(max) = self.max_conversations else {
            return;
        };
        while self.conversations.len() > max {
            let Some(oldest) = self.conversations.keys().next().copied() else {
                break;
            };
            if oldest == keep {
                break;
            }
            self.conversations.remove(&oldest);
            debug!(id = %oldest, "evicted conversation over retention cap");
        }
    }

    fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.conversations)?;
        self.backend.set(HISTORY_KEY, &raw)
    }
}
