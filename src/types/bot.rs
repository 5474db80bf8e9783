//! Shareable bot configuration.

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_BOT_NAME: &str = "AI Assistant";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_USER_COLOR: &str = "#007bff";
pub const DEFAULT_AI_COLOR: &str = "#333333";

/// Persona settings carried by a share link.
///
/// Field names on the wire (`cUser`, `cAi`) match links already in
/// circulation. Every field is optional on decode, and a `null` or empty
/// value counts as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name", deserialize_with = "name_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub persona: String,
    #[serde(default = "default_model", deserialize_with = "model_or_default")]
    pub model: String,
    #[serde(
        rename = "cUser",
        default = "default_user_color",
        deserialize_with = "user_color_or_default"
    )]
    pub color_user: String,
    #[serde(
        rename = "cAi",
        default = "default_ai_color",
        deserialize_with = "ai_color_or_default"
    )]
    pub color_ai: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            persona: String::new(),
            model: default_model(),
            color_user: default_user_color(),
            color_ai: default_ai_color(),
        }
    }
}

fn default_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_user_color() -> String {
    DEFAULT_USER_COLOR.to_string()
}

fn default_ai_color() -> String {
    DEFAULT_AI_COLOR.to_string()
}

fn text_or<'de, D>(deserializer: D, fallback: fn() -> String) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).unwrap_or_else(fallback))
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, String::new)
}

fn name_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, default_name)
}

fn model_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, default_model)
}

fn user_color_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, default_user_color)
}

fn ai_color_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, default_ai_color)
}
