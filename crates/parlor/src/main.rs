//! # parlor
//!
//! Support chat relay server binary — wires the store, relay, room registry,
//! and push dispatcher together and starts the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parlor_server::config::ServerConfig;
use parlor_server::http::{self, AppState};
use parlor_server::push::{
    ApnsPushDelegate, ApnsService, DisabledPushDelegate, PushDelegate, PushNotifier,
    load_push_config,
};
use parlor_server::relay::Relay;
use parlor_server::ws::rooms::RoomRegistry;
use parlor_store::{ChatStore, ConnectionConfig};

/// Support chat relay server.
#[derive(Parser, Debug)]
#[command(name = "parlor", about = "Support chat relay server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".parlor").join("parlor.db")
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Build the push delegate: real APNs when credentials load, otherwise a
/// disabled stand-in so the relay keeps working without them.
fn build_push_delegate(config: &ServerConfig) -> Arc<dyn PushDelegate> {
    let Some(apns_config) = config.apns_dir.as_deref().and_then(load_push_config) else {
        tracing::info!("no APNs config — push notifications disabled");
        return Arc::new(DisabledPushDelegate);
    };
    match ApnsService::new(apns_config) {
        Ok(service) => {
            tracing::info!("APNs service initialized — push notifications enabled");
            Arc::new(ApnsPushDelegate::new(Arc::new(service)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "APNs init failed — push notifications disabled");
            Arc::new(DisabledPushDelegate)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    parlor_core::logging::init_subscriber("info");

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::from_env()
    };

    // Database
    let db_path = args.db_path.unwrap_or_else(Cli::default_db_path);
    ensure_parent_dir(&db_path)?;
    let db_str = db_path.to_string_lossy();
    let pool = parlor_store::new_file(&db_str, &ConnectionConfig::default())
        .context("Failed to open database")?;
    {
        let conn = pool.get().context("Failed to get DB connection")?;
        parlor_store::run_migrations(&conn).context("Failed to run migrations")?;
    }
    tracing::info!(path = %db_path.display(), "database ready");

    // Metrics recorder (global) — before the first counter is touched.
    let metrics = parlor_server::metrics::install_recorder();

    // Core services
    let store = Arc::new(ChatStore::new(pool));
    let rooms = Arc::new(RoomRegistry::new());
    let delegate = build_push_delegate(&config);
    let notifier = Arc::new(PushNotifier::new(Arc::clone(&store), delegate));
    let relay = Arc::new(Relay::new(
        Arc::clone(&store),
        Arc::clone(&rooms),
        notifier,
    ));

    let state = AppState {
        store,
        relay,
        rooms,
        admin_password: Arc::from(config.admin_password.as_str()),
        metrics,
    };

    let handle = http::start(&config.host, config.port, state)
        .await
        .context("Failed to bind server")?;
    let addr = format!("{}:{}", config.host, handle.port);
    tracing::info!("parlor listening on http://{addr}");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    Ok(())
}
