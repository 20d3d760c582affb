//! Re-categorization at the component boundary: errors crossing into the
//! orchestrator's public API are mapped onto the shared [`model::ErrorKind`]
//! taxonomy rather than leaking their originating crate's local error type.

use model::{ErrorKind, error::EngineError};

pub fn invalid_input(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::InvalidInput(reason.into()))
}

pub fn not_found(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::NotFound(reason.into()))
}

pub fn stale(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::Stale(reason.into()))
}

pub fn transient(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::Transient(reason.into()))
}

pub fn circuit_open(reason: impl Into<String>, retry_after_ms: u64) -> EngineError {
    EngineError::new(ErrorKind::CircuitOpen { reason: reason.into(), retry_after_ms })
}

pub fn consensus_failed(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::ConsensusFailed(reason.into()))
}

pub fn atomicity_violation(reason: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::AtomicityViolation(reason.into()))
}

pub fn from_auction_error(err: model::AuctionError) -> EngineError {
    match err {
        model::AuctionError::AuctionEnded => stale("auction has already ended"),
        model::AuctionError::Bid(bid_err) => from_bid_error(bid_err),
    }
}

pub fn from_bid_error(err: model::bid::BidError) -> EngineError {
    invalid_input(err.to_string())
}
