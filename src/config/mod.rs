//! Configuration system (layered: defaults < `config.toml` < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::provider::{ProviderEndpoints, DEFAULT_TIMEOUT};

/// Name of the optional settings file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:8080/";
pub const DEFAULT_USER_NAME: &str = "You";

/// Runtime settings for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Where history and credentials are kept.
    pub data_dir: PathBuf,
    /// Upper bound on one provider exchange.
    pub timeout: Duration,
    /// `None` keeps history unbounded.
    pub max_conversations: Option<usize>,
    /// Page that share links point at.
    pub share_base_url: String,
    /// Label shown next to the user's own messages.
    pub user_name: String,
    pub endpoints: ProviderEndpoints,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeout: DEFAULT_TIMEOUT,
            max_conversations: None,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            user_name: DEFAULT_USER_NAME.to_string(),
            endpoints: ProviderEndpoints::default(),
        }
    }
}

/// `config.toml` contents. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    timeout_secs: Option<u64>,
    max_conversations: Option<usize>,
    share_base_url: Option<String>,
    user_name: Option<String>,
    endpoints: EndpointsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointsFile {
    gemini: Option<String>,
    openai: Option<String>,
    groq: Option<String>,
}

impl ChatConfig {
    /// Load from the process environment (after `.env`) and the settings
    /// file in the resolved data directory.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ChatConfig::load`] with an explicit variable lookup.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = env("IKICHAT_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        let path = config.data_dir.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), "applying settings file");
                config.apply_toml(&raw, &path)?;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_toml(&mut self, raw: &str, path: &Path) -> Result<()> {
        let file: ConfigFile = toml::from_str(raw).map_err(|e| {
            ChatError::Configuration(format!("{}: {e}", path.display()))
        })?;

        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs("timeout_secs", secs)?;
        }
        if let Some(max) = file.max_conversations {
            self.max_conversations = (max > 0).then_some(max);
        }
        if let Some(url) = file.share_base_url {
            self.share_base_url = url;
        }
        if let Some(name) = file.user_name {
            self.user_name = name;
        }
        merge(&mut self.endpoints.gemini, file.endpoints.gemini);
        merge(&mut self.endpoints.openai, file.endpoints.openai);
        merge(&mut self.endpoints.groq, file.endpoints.groq);
        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = env("IKICHAT_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("IKICHAT_TIMEOUT_SECS", &raw)?;
            self.timeout = timeout_from_secs("IKICHAT_TIMEOUT_SECS", secs)?;
        }
        if let Some(raw) = env("IKICHAT_MAX_CONVERSATIONS") {
            let max = parse_number::<usize>("IKICHAT_MAX_CONVERSATIONS", &raw)?;
            self.max_conversations = (max > 0).then_some(max);
        }
        if let Some(url) = env("IKICHAT_SHARE_BASE_URL") {
            self.share_base_url = url;
        }
        if let Some(name) = env("IKICHAT_USER_NAME") {
            self.user_name = name;
        }

        let url_mappings = [
            ("GEMINI_BASE_URL", &mut self.endpoints.gemini),
            ("OPENAI_BASE_URL", &mut self.endpoints.openai),
            ("GROQ_BASE_URL", &mut self.endpoints.groq),
        ];
        for (env_var, slot) in url_mappings {
            merge(slot, env(env_var));
        }
        Ok(())
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ChatError::Configuration(format!("{name} must be a whole number, got '{raw}'"))
    })
}

fn timeout_from_secs(name: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(ChatError::Configuration(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".ikichat"))
        .unwrap_or_else(|| PathBuf::from(".ikichat"))
}
