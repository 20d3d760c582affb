//! Bids, as submitted and as revealed in the phantom auction.

use crate::ids::{BidId, BidderId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Monotonic intake tick. Bid acceptance is serialized per auction
/// (single-writer), so this is assigned by the single intake writer, never
/// read from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Timestamp(pub u64);

/// A bid is immutable once accepted into an auction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bid {
    pub bid_id: BidId,
    pub bidder_id: BidderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: Timestamp,
    pub is_marginal: bool,
    /// Only meaningful when `is_marginal`: the minimum quantity the bidder
    /// will accept.
    pub min_quantity: Option<Decimal>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BidError {
    #[error("quantity must be >= 0")]
    NegativeQuantity,
    #[error("price must be >= 0")]
    NegativePrice,
    #[error("bid price {price} is below auction reserve price {reserve_price}")]
    BelowReserve { price: Decimal, reserve_price: Decimal },
    #[error("marginal bid requires a min_quantity")]
    MissingMinQuantity,
}

pub struct NewBid {
    pub bidder_id: BidderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub is_marginal: bool,
    pub min_quantity: Option<Decimal>,
    pub metadata: HashMap<String, String>,
}

impl NewBid {
    /// Validates against the non-auction-specific invariants and the
    /// reserve-price invariant (price must be ≥ the auction's reserve price,
    /// else rejected at intake), then assigns an id and the given monotonic
    /// timestamp.
    pub fn accept(self, reserve_price: Decimal, timestamp: Timestamp) -> Result<Bid, BidError> {
        if self.quantity < Decimal::ZERO {
            return Err(BidError::NegativeQuantity);
        }
        if self.price < Decimal::ZERO {
            return Err(BidError::NegativePrice);
        }
        if self.price < reserve_price {
            return Err(BidError::BelowReserve {
                price: self.price,
                reserve_price,
            });
        }
        if self.is_marginal && self.min_quantity.is_none() {
            return Err(BidError::MissingMinQuantity);
        }
        Ok(Bid {
            bid_id: BidId::next(),
            bidder_id: self.bidder_id,
            quantity: self.quantity,
            price: self.price,
            timestamp,
            is_marginal: self.is_marginal,
            min_quantity: self.min_quantity,
            metadata: self.metadata,
        })
    }
}

/// A revealed bid in the phantom auction: same shape as [`Bid`], revealed
/// against a commitment fixing `(bidder_id, price, quantity, nonce)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhantomBid {
    pub bid_id: BidId,
    pub bidder_id: BidderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: Timestamp,
}
