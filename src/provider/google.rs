//! Google Gemini adapter.

use serde::Deserialize;

use crate::credential::Credential;
use crate::error::DispatchError;

use super::{ChatRequest, ProviderAdapter, ProviderKind};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent`. The key travels as a query parameter and the
/// persona is folded into the single user prompt.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// The one prompt Gemini receives.
pub fn combined_prompt(persona: &str, user_text: &str) -> String {
    format!("Instruction: {persona}\n\nUser: {user_text}")
}

impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn build_request(
        &self,
        client: &reqwest::Client,
        request: &ChatRequest,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": combined_prompt(&request.persona, &request.user_text) }]
            }]
        });
        client
            .post(self.endpoint(&request.model))
            .query(&[("key", credential.expose())])
            .json(&body)
    }

    fn parse_response(&self, body: serde_json::Value) -> Result<String, DispatchError> {
        let data: GeminiResponse = serde_json::from_value(body)
            .map_err(|e| DispatchError::malformed(format!("Gemini response: {e}")))?;
        data.candidates
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::malformed("No candidates in Gemini response"))?
            .content
            .parts
            .into_iter()
            .next()
            .and_then(|part| part.text)
            .ok_or_else(|| DispatchError::malformed("No text part in Gemini candidate"))
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
