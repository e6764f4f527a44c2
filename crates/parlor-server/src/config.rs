//! Server configuration.

use std::path::PathBuf;

/// Admin password accepted when `PARLOR_ADMIN_PASSWORD` is unset.
///
/// The credential is a shared-secret gate for the support console, not a
/// security boundary. Deployments override it via the environment.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Shared secret checked by `POST /api/admin/verify`.
    pub admin_password: String,
    /// Directory holding APNs credentials (`config.json` + `key.p8`).
    /// `None` disables push delivery.
    pub apns_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            apns_dir: None,
        }
    }
}

impl ServerConfig {
    /// Defaults with environment overrides applied.
    ///
    /// `PARLOR_ADMIN_PASSWORD` replaces the admin password and
    /// `PARLOR_APNS_DIR` points at the APNs credential directory.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(password) = std::env::var("PARLOR_ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = password;
            }
        }
        if let Ok(dir) = std::env::var("PARLOR_APNS_DIR") {
            if !dir.is_empty() {
                config.apns_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
