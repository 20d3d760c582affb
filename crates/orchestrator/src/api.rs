//! The transport-agnostic function contracts for the engine's external
//! interfaces, lifted into a trait so an HTTP, gRPC, or in-process caller
//! can sit in front of [`crate::Orchestrator`] without it knowing which.

use async_trait::async_trait;
use model::{
    ClearingResult,
    error::EngineError,
    ids::{AuctionId, BidId, ParticipantId},
};
use rust_decimal::Decimal;

use crate::SettlementOutcome;

/// Parameters for `create_auction`. `supply_schedule` and `tie_breaking` are
/// taken from `model` directly rather than re-declared here.
pub struct CreateAuctionParams {
    pub mechanism: model::Mechanism,
    pub reserve_price: Decimal,
    pub supply_schedule: model::supply::SupplySchedule,
    pub tie_breaking: model::TieBreaking,
    /// The token pair settled against the Router Bridge. Not an explicit
    /// `model::Auction` field (the auction entity itself is commodity-
    /// agnostic); kept at the orchestrator boundary where routing happens.
    pub token_in: String,
    pub token_out: String,
}

pub struct SubmitBidParams {
    pub auction_id: AuctionId,
    pub bidder_id: model::ids::BidderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub is_marginal: bool,
    pub min_quantity: Option<Decimal>,
}

#[async_trait]
pub trait AuctionApi: Send + Sync {
    async fn create_auction(&self, params: CreateAuctionParams) -> Result<AuctionId, EngineError>;

    async fn submit_bid(&self, params: SubmitBidParams) -> Result<BidId, EngineError>;

    async fn cancel_bid(&self, bid_id: BidId) -> Result<(), EngineError>;

    async fn run_auction(&self, auction_id: AuctionId) -> Result<ClearingResult, EngineError>;

    async fn settle(&self, auction_id: AuctionId, max_slippage_bps: u32) -> Result<SettlementOutcome, EngineError>;

    async fn register_participant(&self, address: String, weight: f64) -> Result<ParticipantId, EngineError>;

    async fn heartbeat(&self, participant_id: ParticipantId) -> Result<(), EngineError>;
}
