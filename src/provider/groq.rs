//! Groq adapter (OpenAI-compatible).

use crate::credential::Credential;
use crate::error::DispatchError;

use super::openai::OpenAiAdapter;
use super::{ChatRequest, ProviderAdapter, ProviderKind};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone)]
pub struct GroqAdapter {
    inner: OpenAiAdapter,
}

impl GroqAdapter {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            inner: OpenAiAdapter::with_kind(
                ProviderKind::Groq,
                base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            ),
        }
    }

    pub fn endpoint(&self) -> String {
        self.inner.endpoint()
    }
}

impl ProviderAdapter for GroqAdapter {
    fn kind(&self) -> ProviderKind { self.inner.kind() }
    fn build_request(&self, client: &reqwest::Client, request: &ChatRequest, credential: &Credential) -> reqwest::RequestBuilder {
        self.inner.build_request(client, request, credential)
    }
    fn parse_response(&self, body: serde_json::Value) -> Result<String, DispatchError> {
        self.inner.parse_response(body)
    }
}
