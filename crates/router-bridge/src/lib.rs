//! The external liquidity venue interface: a small `#[async_trait]` trait
//! behind `#[cfg_attr(test, mockall::automock)]` so the executor and
//! orchestrator can be tested without a live venue connection.

pub mod error;
pub mod static_bridge;

pub use error::Error;
pub use static_bridge::StaticRouteRouterBridge;

use async_trait::async_trait;
use model::ids::SettlementId;
use rust_decimal::Decimal;

/// A route through an external venue for a single token pair, as quoted at
/// the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub venue: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub price_impact_bps: u32,
}

/// The receipt of a completed on-venue execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub settlement_id: SettlementId,
    pub amount_out: Decimal,
    pub venue_reference: String,
}

/// Liquidity venues the executor and orchestrator talk to. Implementations
/// own their own connection pooling, retries and rate limiting; this trait is
/// deliberately thin so it can be swapped for any venue (on-chain DEX, RFQ
/// desk, CEX) without touching the settlement logic.
#[cfg_attr(feature = "test-util", mockall::automock)]
#[async_trait]
pub trait RouterBridge: Send + Sync {
    /// Quotes the best available route for a swap, without committing to it.
    async fn quote(&self, token_in: &str, token_out: &str, amount_in: Decimal) -> Result<Route, Error>;

    /// Executes a previously quoted route. Venues are expected to reject a
    /// quote that has gone stale rather than silently re-quoting.
    async fn execute(&self, settlement_id: SettlementId, route: &Route) -> Result<Execution, Error>;

    /// A lightweight spot price, used by the phantom auction and circuit
    /// breaker health checks where a full quote round-trip is unnecessary.
    async fn spot_price(&self, token_in: &str, token_out: &str) -> Result<Decimal, Error>;
}
