//! HTTP client construction, auth headers and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::DispatchError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client used for every provider call.
///
/// Only the connect phase is bounded here; the whole exchange is bounded by
/// the dispatcher's own timeout.
pub fn build_client() -> Result<reqwest::Client, DispatchError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(4)
        .build()?)
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success status to an error, keeping the body for the log.
pub fn status_to_error(status: u16, body: &str) -> DispatchError {
    let message = error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        401 | 403 => DispatchError::Authentication(message),
        429 => DispatchError::RateLimited(message),
        _ => DispatchError::api(status, message),
    }
}

/// Both Gemini and OpenAI-style APIs report `{"error": {"message": ...}}`.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
