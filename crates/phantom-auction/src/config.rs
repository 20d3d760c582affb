use crate::mechanism::PhantomMechanism;
use std::time::Duration;

/// Phantom auction tuning, composed into the auction engine's top-level
/// `Arguments` via `#[clap(flatten)]`.
#[derive(clap::Parser, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PhantomAuctionArgs {
    /// Total duration of the phantom auction, commit window plus reveal
    /// window.
    #[clap(long, env, default_value = "500ms", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// How much of `duration`, counted from the end, is reserved for the
    /// reveal window.
    #[clap(long, env, default_value = "150ms", value_parser = humantime::parse_duration)]
    #[serde(with = "humantime_serde")]
    pub reveal_delay: Duration,

    /// Minimum acceptable improvement over `base_price`, in basis points.
    #[clap(long, env, default_value = "0")]
    pub min_improvement_bps: u32,

    /// Maximum acceptable improvement over `base_price`, in basis points.
    /// Guards against a single outlier reveal producing an implausible
    /// clearing price.
    #[clap(long, env, default_value = "500")]
    pub max_improvement_bps: u32,

    /// Minimum number of valid revealed bids required to accept a result.
    #[clap(long, env, default_value = "2")]
    pub min_participants: u32,

    #[clap(long, env, value_enum, default_value = "uniform")]
    pub mechanism: PhantomMechanism,
}
