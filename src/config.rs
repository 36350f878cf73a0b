//! Configuration types for the conversation core.

use crate::backend::ChatAction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the assistant chat core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Streaming session timing.
    pub session: SessionConfig,
    /// Display identities for the two speakers.
    pub identity: IdentityConfig,
    /// Defaults attached to every generation request.
    pub request: RequestConfig,
    /// Mood metadata on bot messages.
    pub mood: MoodConfig,
}

/// Streaming session timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Flush period for draining buffered tokens into the view, in ms.
    ///
    /// This decouples token-arrival rate from view-update rate: a shorter
    /// interval lowers display latency, a longer one reduces rendering
    /// churn. Token latency is bounded by this interval.
    pub flush_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 50,
        }
    }
}

/// Display names used for conversation entries and name stripping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Name shown on user messages.
    pub user_name: String,
    /// Name shown on assistant messages.
    pub bot_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_name: "User".to_owned(),
            bot_name: "Aria".to_owned(),
        }
    }
}

/// Default request options for outbound generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Maximum tokens to generate per response.
    pub max_tokens: usize,
    /// Sampling temperature (0.0 = greedy, higher = more random).
    pub temperature: f64,
    /// Top-p (nucleus) sampling threshold.
    pub top_p: f64,
    /// Repeat penalty for generated tokens.
    pub repeat_penalty: f32,
    /// Action requested when the prompt carries no explicit one.
    pub default_action: ChatAction,
    /// Whether replies should also be spoken by the TTS collaborator.
    pub want_speech_reply: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
            default_action: ChatAction::default(),
            want_speech_reply: false,
        }
    }
}

/// Mood metadata configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Whether bot messages get heuristic mood/mood-emoji metadata.
    pub enabled: bool,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::ChatError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/aria/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("aria").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("aria")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/aria-config/config.toml")
        }
    }

    /// Flush period as a [`Duration`].
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.session.flush_interval_ms)
    }
}
