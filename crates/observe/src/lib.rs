//! Structured logging setup: `tracing::{info,warn,error}` plus
//! `#[tracing::instrument]` spans keyed on `auction_id`/`batch_id`.
//!
//! Metrics export and log shipping are out of scope collaborators, so this
//! carries only the `tracing_subscriber` half of the stack — no
//! `prometheus`, no `opentelemetry`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TracingConfig {
    /// `tracing_subscriber::EnvFilter` directive string, e.g.
    /// `"auction_engine=info,orchestrator=debug"`.
    pub log_filter: String,
    pub use_json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            use_json: false,
        }
    }
}

/// Installs a global `tracing` subscriber. Mirrors `autopilot::main`'s
/// startup sequence; idempotent-enough for tests via `try_init`, which
/// silently no-ops if a subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.use_json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    if let Err(err) = result {
        // A subscriber is already installed (common in tests that spawn
        // multiple engines in-process); this is not fatal.
        eprintln!("tracing subscriber already initialized: {err}");
    }
}
