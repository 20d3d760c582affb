use std::time::Duration;

/// Circuit breaker tuning, composed into the auction engine's top-level
/// `Arguments` via `#[clap(flatten)]`.
#[derive(clap::Parser, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircuitBreakerArgs {
    /// Consecutive failures (including slow calls) that trip the breaker.
    #[clap(long, env, default_value = "5")]
    pub failure_threshold: u32,

    /// Error percentage (0-100) over `volume_threshold` samples that trips
    /// the breaker, even without `failure_threshold` consecutive failures.
    #[clap(long, env, default_value = "50")]
    pub error_percentage_threshold: u32,

    /// Minimum number of samples in the sliding window before
    /// `error_percentage_threshold` is evaluated.
    #[clap(long, env, default_value = "10")]
    pub volume_threshold: u32,

    /// Calls slower than this are counted as failures for tripping purposes.
    #[clap(long, env, default_value = "2s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub slow_call_threshold: Duration,

    /// How long the breaker stays open before allowing a half-open probe.
    #[clap(long, env, default_value = "30s", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Consecutive successful half-open probes required to close the breaker.
    #[clap(long, env, default_value = "3")]
    pub recovery_threshold: u32,

    /// Concurrent probes admitted while half-open.
    #[clap(long, env, default_value = "1")]
    pub half_open_max_calls: u32,

    /// Size of the sliding window of recorded outcomes.
    #[clap(long, env, default_value = "20")]
    pub window_size: u32,
}
