//! Structured logging via the `tracing` ecosystem.
//!
//! Log context (session id, connection id, role) is carried on spans and
//! structured fields rather than interpolated into message strings.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `PARLOR_LOG` overrides the default filter (same syntax as `RUST_LOG`,
/// e.g. `parlor_server=debug,info`).
///
/// # Arguments
///
/// * `level` - Filter applied when `PARLOR_LOG` is unset. Defaults to `"info"`
///   at the call sites.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PARLOR_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
