//! Share-link codec for [`BotConfig`].
//!
//! A configuration travels as compact JSON wrapped in URL-safe base64 inside
//! the `c` query parameter of a link. Nothing is compressed or encrypted: a
//! persona is meant to be readable by whoever receives the link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Url;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::types::BotConfig;

/// Query parameter carrying the encoded configuration.
pub const SHARE_PARAM: &str = "c";

/// Encode a configuration as a URL-safe blob.
pub fn encode(config: &BotConfig) -> Result<String> {
    let json = serde_json::to_vec(config)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a blob produced by [`encode`] or by a browser's `btoa`.
///
/// Both base64 alphabets are accepted, with or without padding. Spaces are
/// read as `+`, since query decoding turns an unescaped `+` into a space.
/// Absent, `null` and empty fields take their defaults; anything that is not
/// valid base64 of a JSON object is a [`ChatError::Decode`].
pub fn decode(blob: &str) -> Result<BotConfig> {
    let normalized: String = blob
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    if normalized.is_empty() {
        return Err(ChatError::Decode("empty configuration".into()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| ChatError::Decode(format!("not base64: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ChatError::Decode(format!("not JSON: {e}")))?;
    if !value.is_object() {
        return Err(ChatError::Decode("configuration is not a JSON object".into()));
    }
    let config: BotConfig = serde_json::from_value(value)
        .map_err(|e| ChatError::Decode(format!("not a configuration object: {e}")))?;

    debug!(model = %config.model, name = %config.name, "decoded shared configuration");
    Ok(config)
}

/// Build a share link by setting the `c` parameter on `base`.
///
/// Other query parameters on `base` are preserved; an existing `c` is
/// replaced.
pub fn share_link(base: &str, config: &BotConfig) -> Result<String> {
    let blob = encode(config)?;
    let mut url = Url::parse(base).map_err(|e| {
        ChatError::Configuration(format!("invalid share base URL '{base}': {e}"))
    })?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SHARE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(SHARE_PARAM, &blob);
    }

    Ok(url.to_string())
}

/// Pull the configuration blob out of user input.
///
/// A full link yields its `c` parameter (or `None` when it has none); any
/// other non-empty input is taken to be the blob itself.
pub fn extract_share_param(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) if url.has_host() => url
            .query_pairs()
            .find(|(key, _)| key == SHARE_PARAM)
            .map(|(_, value)| value.into_owned()),
        _ => Some(input.to_string()),
    }
}
