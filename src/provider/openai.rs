//! OpenAI Chat Completions adapter.

use serde::Deserialize;

use crate::credential::Credential;
use crate::error::DispatchError;

use super::http::bearer_headers;
use super::{ChatRequest, ProviderAdapter, ProviderKind};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `POST {base}/chat/completions` with a system + user exchange.
///
/// Also drives any other service speaking the same schema; see
/// [`super::groq::GroqAdapter`].
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    kind: ProviderKind,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(base_url: Option<String>) -> Self {
        Self::with_kind(ProviderKind::OpenAi, base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
    }

    pub(crate) fn with_kind(kind: ProviderKind, base_url: &str) -> Self {
        Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn build_request(
        &self,
        client: &reqwest::Client,
        request: &ChatRequest,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.persona },
                { "role": "user", "content": request.user_text },
            ],
        });
        client
            .post(self.endpoint())
            .headers(bearer_headers(credential.expose()))
            .json(&body)
    }

    fn parse_response(&self, body: serde_json::Value) -> Result<String, DispatchError> {
        let data: ChatCompletion = serde_json::from_value(body)
            .map_err(|e| DispatchError::malformed(format!("{} response: {e}", self.kind)))?;
        data.choices
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::malformed(format!("No choices in {} response", self.kind)))?
            .message
            .content
            .ok_or_else(|| DispatchError::malformed(format!("No content in {} choice", self.kind)))
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_choice_content() {
        let adapter = OpenAiAdapter::new(None);
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}]
        });
        assert_eq!(adapter.parse_response(body).unwrap(), "Hello!");
    }

    #[test]
    fn null_content_is_malformed() {
        let adapter = OpenAiAdapter::new(None);
        let body = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert!(matches!(
            adapter.parse_response(body),
            Err(DispatchError::MalformedResponse(_))
        ));
        assert!(matches!(
            adapter.parse_response(json!({"choices": []})),
            Err(DispatchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let adapter = OpenAiAdapter::new(Some("http://localhost:1234/v1/".into()));
        assert_eq!(adapter.endpoint(), "http://localhost:1234/v1/chat/completions");
    }
}
