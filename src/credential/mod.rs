//! API key persistence and per-session resolution.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::storage::{KeyValueStore, LAST_CREDENTIAL_KEY, SHARED_CREDENTIAL_KEY};

/// A provider API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, returning `None` for blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// How the session was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Normal use: history listing visible, settings edited by hand.
    Manual,
    /// Opened from a share link: fields pre-filled, history listing hidden.
    Guided,
}

/// Asks the user for a key when a shared link is opened for the first time.
pub trait CredentialPrompt {
    /// Return the entered key, or `None` if the user gave nothing.
    fn ask(&mut self, message: &str) -> Option<String>;
}

impl<F> CredentialPrompt for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn ask(&mut self, message: &str) -> Option<String> {
        self(message)
    }
}

pub const SHARED_LINK_PROMPT: &str = "Enter your API key to get started:";

/// The two persisted credential slots.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn last_used(&self) -> Result<Option<Credential>> {
        Ok(self.backend.get(LAST_CREDENTIAL_KEY)?.and_then(Credential::new))
    }

    pub fn remember_last_used(&self, credential: &Credential) -> Result<()> {
        self.backend.set(LAST_CREDENTIAL_KEY, credential.expose())
    }

    pub fn shared_link(&self) -> Result<Option<Credential>> {
        Ok(self
            .backend
            .get(SHARED_CREDENTIAL_KEY)?
            .and_then(Credential::new))
    }

    pub fn remember_shared_link(&self, credential: &Credential) -> Result<()> {
        self.backend.set(SHARED_CREDENTIAL_KEY, credential.expose())
    }

    /// Pick the session's single active key.
    ///
    /// Guided sessions use the shared-link slot, prompting once (and saving
    /// a non-blank answer) when it is empty. Manual sessions use the
    /// last-used slot and never prompt.
    pub fn resolve(
        &self,
        mode: SessionMode,
        prompt: &mut dyn CredentialPrompt,
    ) -> Result<Option<Credential>> {
        match mode {
            SessionMode::Manual => self.last_used(),
            SessionMode::Guided => {
                if let Some(saved) = self.shared_link()? {
                    debug!("using saved shared-link credential");
                    return Ok(Some(saved));
                }
                let entered = prompt.ask(SHARED_LINK_PROMPT).and_then(Credential::new);
                if let Some(ref credential) = entered {
                    self.remember_shared_link(credential)?;
                    info!("saved credential for shared links");
                }
                Ok(entered)
            }
        }
    }
}
