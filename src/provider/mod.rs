//! Model provider adapters and the dispatcher that routes between them.

pub mod google;
pub mod groq;
pub mod http;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use strum::Display;
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::{ChatError, DispatchError};
use crate::util::timeout::with_timeout;

pub use google::GeminiAdapter;
pub use groq::GroqAdapter;
pub use openai::OpenAiAdapter;

/// Default bound on one provider exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The closed set of request/response schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProviderKind {
    #[strum(serialize = "gemini")]
    Gemini,
    #[strum(serialize = "openai")]
    OpenAi,
    #[strum(serialize = "groq")]
    Groq,
}

impl ProviderKind {
    /// Route a model id: `gemini` wins over `gpt`; anything else goes to Groq.
    /// Matching is a case-insensitive substring test.
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        if model.contains("gemini") {
            Self::Gemini
        } else if model.contains("gpt") {
            Self::OpenAi
        } else {
            Self::Groq
        }
    }
}

/// One outbound chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub persona: String,
    pub user_text: String,
}

impl ChatRequest {
    pub fn new(
        model: impl Into<String>,
        persona: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            persona: persona.into(),
            user_text: user_text.into(),
        }
    }
}

/// Request/response shape of one provider family.
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn build_request(
        &self,
        client: &reqwest::Client,
        request: &ChatRequest,
        credential: &Credential,
    ) -> reqwest::RequestBuilder;

    /// Extract the reply text from a successful response body.
    fn parse_response(&self, body: serde_json::Value) -> Result<String, DispatchError>;
}

/// Anything that can answer a chat turn.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<String, DispatchError>;
}

/// Base URL overrides; `None` uses each provider's public endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gemini: Option<String>,
    pub openai: Option<String>,
    pub groq: Option<String>,
}

/// Routes each request to its adapter and performs the HTTP exchange.
pub struct Dispatcher {
    client: reqwest::Client,
    gemini: GeminiAdapter,
    openai: OpenAiAdapter,
    groq: GroqAdapter,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(endpoints: ProviderEndpoints, timeout: Duration) -> Result<Self, ChatError> {
        let client = http::build_client()
            .map_err(|e| ChatError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            gemini: GeminiAdapter::new(endpoints.gemini),
            openai: OpenAiAdapter::new(endpoints.openai),
            groq: GroqAdapter::new(endpoints.groq),
            timeout,
        })
    }

    pub fn adapter(&self, kind: ProviderKind) -> &dyn ProviderAdapter {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Groq => &self.groq,
        }
    }

    async fn exchange(
        &self,
        adapter: &dyn ProviderAdapter,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<String, DispatchError> {
        let resp = adapter
            .build_request(&self.client, request, credential)
            .send()
            .await?;

        let status = resp.status();
        let body_text = resp.text().await?;
        if !status.is_success() {
            return Err(http::status_to_error(status.as_u16(), &body_text));
        }

        let body: serde_json::Value = serde_json::from_str(&body_text).map_err(|e| {
            DispatchError::malformed(format!("{} returned a non-JSON body: {e}", adapter.kind()))
        })?;
        adapter.parse_response(body)
    }
}

#[async_trait]
impl ChatBackend for Dispatcher {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<String, DispatchError> {
        let kind = ProviderKind::for_model(&request.model);
        debug!(provider = %kind, model = %request.model, "dispatching chat request");

        let adapter = self.adapter(kind);
        let result = with_timeout(self.timeout, self.exchange(adapter, request, credential)).await;
        if let Err(ref err) = result {
            warn!(
                provider = %kind,
                model = %request.model,
                category = ?err.category(),
                error = %err,
                "provider call failed"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_is_a_function_of_the_model_id() {
        assert_eq!(ProviderKind::for_model("gemini-1.5-flash"), ProviderKind::Gemini);
        assert_eq!(ProviderKind::for_model("gpt-4o"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::for_model("llama3-70b"), ProviderKind::Groq);
    }

    #[test]
    fn routing_ignores_case_and_prefers_gemini() {
        assert_eq!(ProviderKind::for_model("Models/GEMINI-Pro"), ProviderKind::Gemini);
        assert_eq!(ProviderKind::for_model("GPT-4o-mini"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::for_model("gemini-gpt-hybrid"), ProviderKind::Gemini);
        assert_eq!(ProviderKind::for_model(""), ProviderKind::Groq);
    }

    #[test]
    fn dispatcher_exposes_one_adapter_per_kind() {
        let dispatcher = Dispatcher::new(ProviderEndpoints::default(), DEFAULT_TIMEOUT).unwrap();
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAi, ProviderKind::Groq] {
            assert_eq!(dispatcher.adapter(kind).kind(), kind);
        }
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    }
}
