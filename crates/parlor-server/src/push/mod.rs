//! Push notification delivery (APNs).
//!
//! Provides JWT-based authentication and HTTP/2 delivery to Apple's APNs
//! servers, behind a delegate seam so everything above it is testable
//! without network access. Credentials load from a directory holding
//! `config.json` and `key.p8`; without one, delivery is disabled and the
//! rest of the relay is unaffected.

mod config;
mod notifier;
mod service;
mod types;

pub use config::{PushConfig, load_push_config};
pub use notifier::{
    ApnsPushDelegate, DisabledPushDelegate, IMAGE_BODY, NOTIFICATION_TITLE, PushDelegate,
    PushNotifier,
};
pub use service::{ApnsError, ApnsService};
pub use types::{PushNotification, PushSendResult};
