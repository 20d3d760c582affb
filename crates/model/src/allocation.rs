//! The per-bid result of clearing, and the clearing engine's overall output.

use crate::ids::{BidId, BidderId};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Allocation {
    pub bid_id: BidId,
    pub bidder_id: BidderId,
    pub allocated_quantity: Decimal,
    pub clearing_price: Decimal,
    /// Fraction of the tied tier awarded pro-rata; `None` for bids that
    /// cleared fully above the tie tier.
    pub pro_rata_share: Option<Decimal>,
    /// Rank among tied bids by timestamp; `None` outside the tied tier.
    pub time_priority_rank: Option<usize>,
}

/// Output of `clearing_engine::clear`. Kept in `model` rather than in
/// `clearing-engine` so `orchestrator` can name this type without depending
/// on the clearing engine's internal tie-break module.
#[derive(Debug, Clone)]
pub struct ClearingResult {
    pub clearing_price: Decimal,
    pub allocations: Vec<Allocation>,
    pub total_allocated: Decimal,
    pub unfilled_demand: Decimal,
}
