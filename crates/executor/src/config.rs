/// Executor tuning, composed into the auction engine's top-level `Arguments`
/// via `#[clap(flatten)]`.
#[derive(clap::Parser, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExecutorArgs {
    #[clap(long, env, default_value = "50")]
    pub max_batch_size: usize,

    #[clap(long, env, default_value = "3")]
    pub max_retries: u32,

    /// Per-settlement slippage tolerance, in basis points.
    #[clap(long, env, default_value = "100")]
    pub max_slippage_tolerance_bps: u32,

    /// Allowed deviation of `expected_amount_out / amount_in` from the
    /// current spot price, in basis points.
    #[clap(long, env, default_value = "200")]
    pub max_price_deviation_bps: u32,

    /// Aggregate gas budget for a batch.
    #[clap(long, env, default_value = "10000000")]
    pub gas_limit: u64,
}
