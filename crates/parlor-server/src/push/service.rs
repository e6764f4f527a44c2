//! APNs delivery — JWT signing, HTTP/2 notification posts.
//!
//! Uses `reqwest` for HTTP/2 transport and `jsonwebtoken` for ES256 JWT signing.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parlor_core::text::truncate_str;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::PushConfig;
use super::types::{PushNotification, PushSendResult};

/// JWT token validity period (55 minutes, refreshed before Apple's 1-hour expiry).
const TOKEN_VALIDITY: Duration = Duration::from_secs(55 * 60);

/// JWT claims for APNs authentication.
#[derive(Debug, Serialize, Deserialize)]
struct ApnsClaims {
    /// Issuer (Team ID).
    iss: String,
    /// Issued at (Unix timestamp).
    iat: i64,
}

/// Cached JWT token with expiry tracking.
struct CachedToken {
    token: String,
    created_at: Instant,
}

/// APNs client for sending push notifications to Apple devices.
pub struct ApnsService {
    config: PushConfig,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cached_token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ApnsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApnsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApnsService {
    /// Create a new APNs service from config.
    ///
    /// Reads the private key from disk and builds an HTTP/2 client.
    pub fn new(config: PushConfig) -> Result<Self, ApnsError> {
        let key_pem = std::fs::read(&config.key_path).map_err(|e| ApnsError::KeyRead {
            path: config.key_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let encoding_key = EncodingKey::from_ec_pem(&key_pem).map_err(|e| ApnsError::KeyParse {
            reason: e.to_string(),
        })?;

        // APNs requires HTTP/2. Force it via http2_prior_knowledge — ALPN
        // alone isn't enough because reqwest defaults to HTTP/1.1 unless told otherwise.
        let client = reqwest::Client::builder()
            .http2_prior_knowledge()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApnsError::ClientBuild {
                reason: e.to_string(),
            })?;

        info!(
            key_id = %config.key_id,
            team_id = %config.team_id,
            environment = %config.environment,
            "APNs service initialized"
        );

        Ok(Self {
            config,
            encoding_key,
            client,
            cached_token: Mutex::new(None),
        })
    }

    /// Send a notification to a single device. Never returns an error:
    /// every failure mode is folded into the [`PushSendResult`].
    pub async fn send(
        &self,
        device_token: &str,
        notification: &PushNotification,
    ) -> PushSendResult {
        let jwt = match self.get_or_refresh_token() {
            Ok(t) => t,
            Err(e) => return PushSendResult::failure(format!("JWT generation failed: {e}")),
        };

        let url = format!(
            "https://{}:443/3/device/{}",
            self.config.apns_host(),
            device_token
        );

        let payload = build_payload(notification);

        info!(
            url = %url,
            token_prefix = truncate_str(device_token, 8),
            bundle_id = %self.config.bundle_id,
            "APNs request"
        );

        let result = self
            .client
            .post(&url)
            .header("authorization", format!("bearer {jwt}"))
            .header("apns-topic", &self.config.bundle_id)
            .header("apns-push-type", "alert")
            .header("apns-priority", "10")
            .header("apns-expiration", "0")
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let apns_id = response
                    .headers()
                    .get("apns-id")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);

                if response.status().is_success() {
                    info!(
                        status,
                        token_prefix = truncate_str(device_token, 8),
                        apns_id = ?apns_id,
                        "APNs send OK"
                    );
                    PushSendResult {
                        success: true,
                        status_code: Some(status),
                        apns_id,
                        reason: None,
                        error: None,
                    }
                } else {
                    let body = response.text().await.unwrap_or_default();
                    let reason = serde_json::from_str::<serde_json::Value>(&body)
                        .ok()
                        .and_then(|v| v.get("reason")?.as_str().map(String::from));

                    warn!(
                        status,
                        reason = ?reason,
                        body = %body,
                        token_prefix = truncate_str(device_token, 8),
                        "APNs send FAILED"
                    );

                    PushSendResult {
                        success: false,
                        status_code: Some(status),
                        apns_id,
                        reason,
                        error: Some(body),
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, url = %url, "APNs HTTP request FAILED (transport error)");
                PushSendResult::failure(e.to_string())
            }
        }
    }

    /// Get a cached JWT or generate a new one.
    fn get_or_refresh_token(&self) -> Result<String, ApnsError> {
        let mut cached = self
            .cached_token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(ref token) = *cached {
            if token.created_at.elapsed() < TOKEN_VALIDITY {
                return Ok(token.token.clone());
            }
        }

        let jwt = self.generate_jwt()?;
        *cached = Some(CachedToken {
            token: jwt.clone(),
            created_at: Instant::now(),
        });

        Ok(jwt)
    }

    /// Generate a new ES256 JWT for APNs authentication.
    fn generate_jwt(&self) -> Result<String, ApnsError> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());

        let claims = ApnsClaims {
            iss: self.config.team_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| ApnsError::JwtSign {
            reason: e.to_string(),
        })
    }
}

/// Build the APNs JSON payload.
fn build_payload(notification: &PushNotification) -> serde_json::Value {
    let mut aps = serde_json::json!({
        "alert": {
            "title": notification.title,
            "body": notification.body,
        },
    });

    if let Some(ref sound) = notification.sound {
        aps["sound"] = serde_json::json!(sound);
    }
    if let Some(ref thread_id) = notification.thread_id {
        aps["thread-id"] = serde_json::json!(thread_id);
    }

    serde_json::json!({ "aps": aps })
}

/// APNs service errors.
#[derive(Debug, thiserror::Error)]
pub enum ApnsError {
    /// Failed to read private key file.
    #[error("failed to read APNs key at {path}: {reason}")]
    KeyRead {
        /// Key file path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// Failed to parse private key.
    #[error("failed to parse APNs key: {reason}")]
    KeyParse {
        /// Error description.
        reason: String,
    },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Error description.
        reason: String,
    },
    /// Failed to sign JWT.
    #[error("failed to sign JWT: {reason}")]
    JwtSign {
        /// Error description.
        reason: String,
    },
}
