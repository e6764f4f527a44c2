//! APNs credential loading.
//!
//! A credential directory holds `config.json` (key id, team id, bundle id,
//! environment) and the ES256 private key as `key.p8`. Loading is
//! best-effort: any missing or malformed piece disables push delivery
//! rather than failing startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// APNs configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    /// APNs auth key ID (10 characters, from the developer portal).
    pub key_id: String,
    /// Apple developer team ID.
    pub team_id: String,
    /// App bundle identifier, sent as `apns-topic`.
    pub bundle_id: String,
    /// `"sandbox"` or `"production"`.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Path to the `.p8` private key, resolved next to `config.json`.
    #[serde(skip)]
    pub key_path: PathBuf,
}

fn default_environment() -> String {
    "sandbox".to_string()
}

impl PushConfig {
    /// APNs host for the configured environment.
    pub fn apns_host(&self) -> &'static str {
        if self.environment == "production" {
            "api.push.apple.com"
        } else {
            "api.sandbox.push.apple.com"
        }
    }
}

/// Load APNs credentials from a directory, `None` when absent or invalid.
pub fn load_push_config(dir: &Path) -> Option<PushConfig> {
    let config_path = dir.join("config.json");
    let contents = std::fs::read_to_string(&config_path).ok()?;
    match serde_json::from_str::<PushConfig>(&contents) {
        Ok(mut config) => {
            config.key_path = dir.join("key.p8");
            Some(config)
        }
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "invalid APNs config");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
