//! Top-level configuration, composed from each component's own `Args`
//! struct via `#[clap(flatten)]`, the same pattern
//! `autopilot::arguments::Arguments` uses to pull in
//! `shared::arguments::Arguments`, `http_client::Arguments`, and friends.

use std::net::SocketAddr;

#[derive(clap::Parser, Debug, Clone)]
pub struct Arguments {
    #[clap(flatten)]
    pub orchestrator: orchestrator::config::OrchestratorArgs,

    #[clap(flatten)]
    pub phantom_auction: phantom_auction::PhantomAuctionArgs,

    #[clap(flatten)]
    pub circuit_breaker: circuit_breaker::CircuitBreakerArgs,

    #[clap(flatten)]
    pub coordinator: coordinator::CoordinatorArgs,

    #[clap(flatten)]
    pub executor: executor::ExecutorArgs,

    /// `tracing_subscriber::EnvFilter` directive string.
    #[clap(long, env, default_value = "info")]
    pub log_filter: String,

    /// Emit logs as newline-delimited JSON instead of the human-readable
    /// format.
    #[clap(long, env)]
    pub log_json: bool,

    /// Bound (unused without an HTTP surface, kept for config-key parity
    /// with the §6 `auction.*` table; an in-process embedder ignores it).
    #[clap(long, env, default_value = "0.0.0.0:9545")]
    pub bind_addr: SocketAddr,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:#?}")
    }
}
