//! Settings schema definitions.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.

use serde::{Deserialize, Serialize};

/// Root settings structure.
///
/// Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlmanacSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Generative service configuration
    pub ai: AiSettings,

    /// Terminal presentation preferences
    pub ui: UiSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Model used for every generation
    pub model: String,

    /// Response token cap per request
    pub max_tokens: u32,

    /// API root, without the `/v1/messages` path
    pub base_url: String,

    /// Anthropic API key (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Value of the `anthropic-version` header
    pub anthropic_version: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Terminal presentation preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Print the instructions panel on the cover
    pub show_instructions: bool,

    /// Skip the startup banner
    pub hide_banner: bool,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl Default for AlmanacSettings {
    fn default() -> Self {
        Self {
            version: 1,
            ai: AiSettings::default(),
            ui: UiSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: anthropic_messages::models::CLAUDE_SONNET_4.to_string(),
            max_tokens: anthropic_messages::DEFAULT_MAX_TOKENS,
            base_url: anthropic_messages::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            anthropic_version: anthropic_messages::ANTHROPIC_VERSION.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_instructions: true,
            hide_banner: false,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
