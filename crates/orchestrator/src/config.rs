use std::time::Duration;

/// Orchestrator-level tuning, composed into the auction engine's top-level
/// `Arguments` via `#[clap(flatten)]`.
#[derive(clap::Parser, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrchestratorArgs {
    /// Intake cap on concurrent auctions, for backpressure.
    #[clap(long, env, default_value = "100")]
    pub max_concurrent_auctions: usize,

    /// Deadline for a single `run_auction` clearing pass.
    #[clap(long, env, default_value = "5s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub auction_timeout: Duration,
}
