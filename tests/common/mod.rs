//! Shared test helpers: scripted backend, recording view, fixed clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ikichat::credential::{Credential, CredentialStore};
use ikichat::error::DispatchError;
use ikichat::history::{Clock, HistoryEntry, HistoryStore};
use ikichat::provider::{ChatBackend, ChatRequest};
use ikichat::session::{ChatView, SessionParts};
use ikichat::storage::{KeyValueStore, MemoryKeyValueStore};
use ikichat::types::Message;

/// A backend that answers from a queue and records what it was asked.
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<String, DispatchError>>>,
    requests: Mutex<Vec<(ChatRequest, String)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn queue_reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: DispatchError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Requests seen so far, with the key each was sent with.
    pub fn requests(&self) -> Vec<(ChatRequest, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<String, DispatchError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), credential.expose().to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }
}

/// Everything a view was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Message { name: String, text: String, color: String },
    Composing(String),
    DoneComposing,
    Clear,
    History(Vec<HistoryEntry>),
    Alert(String),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shown messages as `(name, text, color)`.
    pub fn messages(&self) -> Vec<(String, String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Message { name, text, color } => {
                    Some((name.clone(), text.clone(), color.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_history(&self) -> Option<Vec<HistoryEntry>> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::History(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }
}

impl ChatView for RecordingView {
    fn show_message(&mut self, message: &Message, color: &str) {
        self.events.push(ViewEvent::Message {
            name: message.name.clone(),
            text: message.text.clone(),
            color: color.to_string(),
        });
    }

    fn show_composing(&mut self, color: &str) {
        self.events.push(ViewEvent::Composing(color.to_string()));
    }

    fn hide_composing(&mut self) {
        self.events.push(ViewEvent::DoneComposing);
    }

    fn clear(&mut self) {
        self.events.push(ViewEvent::Clear);
    }

    fn show_history(&mut self, entries: &[HistoryEntry]) {
        self.events.push(ViewEvent::History(entries.to_vec()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(ViewEvent::Alert(message.to_string()));
    }
}

/// A clock that only moves when told to.
pub struct FixedClock(pub AtomicU64);

impl FixedClock {
    pub fn at(millis: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(millis)))
    }

    pub fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Session parts over an existing store, so a test can reopen it.
pub fn parts_on(
    store: Arc<MemoryKeyValueStore>,
    backend: Arc<dyn ChatBackend>,
    clock: Arc<FixedClock>,
) -> SessionParts {
    let kv: Arc<dyn KeyValueStore> = store;
    let history = HistoryStore::load(kv.clone()).unwrap().with_clock(clock);
    SessionParts {
        history,
        credentials: CredentialStore::new(kv),
        backend,
        user_name: "You".to_string(),
        share_base_url: "http://localhost:8080/".to_string(),
    }
}

/// Fresh in-memory session parts around `backend`, plus the store they share.
pub fn memory_parts(
    backend: Arc<dyn ChatBackend>,
    clock: Arc<FixedClock>,
) -> (Arc<MemoryKeyValueStore>, SessionParts) {
    let store = Arc::new(MemoryKeyValueStore::new());
    let parts = parts_on(store.clone(), backend, clock);
    (store, parts)
}

/// A prompt that must not be consulted.
pub fn no_prompt(message: &str) -> Option<String> {
    panic!("unexpected credential prompt: {message}");
}
