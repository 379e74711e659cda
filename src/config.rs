use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub struct Defaults {
    pub provider_url: &'static str,
    pub model: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub bind: &'static str,
}

pub static DEFAULTS: Defaults = Defaults {
    provider_url: "https://openrouter.ai/api/v1/chat/completions",
    model: "anthropic/claude-sonnet-4",
    temperature: 0.3,
    max_tokens: 4000,
    timeout_secs: 120,
    bind: "127.0.0.1:3000",
};

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Full chat-completions URL.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULTS.provider_url.to_string(),
            model: DEFAULTS.model.to_string(),
            api_key: None,
            temperature: DEFAULTS.temperature,
            max_tokens: DEFAULTS.max_tokens,
            timeout: Duration::from_secs(DEFAULTS.timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Where the theme preference is persisted. In-memory when `None`.
    pub preferences: Option<PathBuf>,
}
