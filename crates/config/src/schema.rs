use serde::{Deserialize, Serialize};

/// Top-level weft configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    pub platform: PlatformConfig,
    pub openai: OpenAiConfig,
    pub tracking: TrackingConfig,
    pub database: DatabaseConfig,
}

/// Messaging platform connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Bot token for the gateway connection.
    pub token: Option<String>,
    /// Guild that hosts the administrative `manage-command` command.
    pub management_guild_id: Option<i64>,
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used when an invocation does not select one.
    pub default_model: String,
    /// Cheap model used for the chat-vs-draw classifier round trip.
    pub classifier_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".into(),
            default_model: "gpt-3.5-turbo-1106".into(),
            classifier_model: "gpt-3.5-turbo-1106".into(),
        }
    }
}

/// Shipment-tracking backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Conversation store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "weft.db".into(),
        }
    }
}
