use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const ENV_URL: &str = "TEAMCENTER_URL";
pub const ENV_USER: &str = "TEAMCENTER_USER";
pub const ENV_PASS: &str = "TEAMCENTER_PASS";

/// Demo defaults, used when the environment does not say otherwise.
pub const DEFAULT_URL: &str = "http://localhost:7001/tc";
pub const DEFAULT_USER: &str = "demo.user";
pub const DEFAULT_PASS: &str = "demo_password";

/// Where and as whom to connect.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ConnectionConfig {
    /// Reads `TEAMCENTER_URL`, `TEAMCENTER_USER` and `TEAMCENTER_PASS`, loading
    /// a `.env` file first if one exists. Unset variables fall back to the demo
    /// defaults with a warning.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let (base_url, url_default) = env_or(ENV_URL, DEFAULT_URL);
        let (username, user_default) = env_or(ENV_USER, DEFAULT_USER);
        let (password, pass_default) = env_or(ENV_PASS, DEFAULT_PASS);

        if url_default || user_default || pass_default {
            warn!("Using demo connection defaults. Set TEAMCENTER_URL, TEAMCENTER_USER and TEAMCENTER_PASS for a real connection.");
        }

        let config = Self {
            base_url,
            username,
            password,
        };
        config.trace_loaded();
        config
    }

    fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            username = %self.username,
            "Loaded connection config"
        );
        debug!(config = ?self, "Connection config loaded (full debug)");
    }
}

fn env_or(key: &str, default: &str) -> (String, bool) {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => (value, false),
        _ => (default.to_string(), true),
    }
}
