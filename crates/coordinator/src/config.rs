use std::time::Duration;

/// Coordinator tuning, composed into the auction engine's top-level
/// `Arguments` via `#[clap(flatten)]`.
#[derive(clap::Parser, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoordinatorArgs {
    #[clap(long, env, default_value = "1s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub prepare_timeout: Duration,

    #[clap(long, env, default_value = "2s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub commit_timeout: Duration,

    /// Weighted yes-ratio required to proceed past prepare or commit.
    /// Defaults to 0.67; production deployments are expected to pass 0.8.
    #[clap(long, env, default_value = "0.67")]
    pub consensus_threshold: f64,

    /// Prepare-phase retries on a transient timeout (not an explicit no
    /// majority).
    #[clap(long, env, default_value = "2")]
    pub retry_count: u32,

    #[clap(long, env, default_value = "5s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,

    #[clap(long, env, default_value = "3")]
    pub heartbeat_multiplier: u32,
}
