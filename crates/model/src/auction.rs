//! The auction entity: bids, supply schedule, and the mechanism it clears
//! with. Mechanisms are a tagged variant sharing composed
//! `tie_breaking`/`supply_schedule` structs, not subclass instances.

use crate::{
    allocation::Allocation,
    bid::{Bid, BidError, NewBid, Timestamp},
    ids::AuctionId,
    supply::SupplySchedule,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    FirstPrice,
    Vickrey,
    Dutch,
    English,
    UniformPrice,
    /// The augmented uniform-price mechanism this core actually clears with.
    Augmented,
}

/// `(pro_rata_weight, time_priority_weight)`, weights in `[0,1]` summing to
/// `1`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TieBreaking {
    pub pro_rata_weight: Decimal,
    pub time_priority_weight: Decimal,
}

#[derive(Debug, thiserror::Error)]
#[error("tie-breaking weights must be in [0,1] and sum to 1, got {pro_rata} + {time_priority}")]
pub struct InvalidTieBreaking {
    pro_rata: Decimal,
    time_priority: Decimal,
}

impl TieBreaking {
    pub fn new(pro_rata_weight: Decimal, time_priority_weight: Decimal) -> Result<Self, InvalidTieBreaking> {
        let zero = Decimal::ZERO;
        let one = Decimal::ONE;
        let sum = pro_rata_weight + time_priority_weight;
        if !(zero..=one).contains(&pro_rata_weight)
            || !(zero..=one).contains(&time_priority_weight)
            || sum != one
        {
            return Err(InvalidTieBreaking {
                pro_rata: pro_rata_weight,
                time_priority: time_priority_weight,
            });
        }
        Ok(Self {
            pro_rata_weight,
            time_priority_weight,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Pending,
    Active,
    Clearing,
    Completed,
    Cancelled,
}

impl AuctionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AuctionStatus::Completed | AuctionStatus::Cancelled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("auction has already ended")]
    AuctionEnded,
    #[error(transparent)]
    Bid(#[from] BidError),
}

#[derive(Debug, Clone)]
pub struct Auction {
    pub auction_id: AuctionId,
    pub mechanism: Mechanism,
    pub reserve_price: Decimal,
    pub supply_schedule: SupplySchedule,
    pub tie_breaking: TieBreaking,
    bids: Vec<Bid>,
    status: AuctionStatus,
    tick: AtomicU64WrapperCounter,
    pub winning_allocations: Vec<Allocation>,
}

/// `AtomicU64` isn't `Clone`; this newtype hand-rolls a clone that copies the
/// current value, which is fine here because an `Auction` is exclusively
/// owned by the orchestrator and never cloned while concurrently mutated.
#[derive(Debug)]
struct AtomicU64WrapperCounter(AtomicU64);

impl Clone for AtomicU64WrapperCounter {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Relaxed)))
    }
}

impl Auction {
    pub fn new(
        mechanism: Mechanism,
        reserve_price: Decimal,
        supply_schedule: SupplySchedule,
        tie_breaking: TieBreaking,
    ) -> Self {
        Self {
            auction_id: AuctionId::next(),
            mechanism,
            reserve_price,
            supply_schedule,
            tie_breaking,
            bids: Vec::new(),
            status: AuctionStatus::Pending,
            tick: AtomicU64WrapperCounter(AtomicU64::new(0)),
            winning_allocations: Vec::new(),
        }
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    /// Single-writer intake: accepts a new bid, validating the reserve-price
    /// invariant and assigning the next monotonic timestamp.
    /// Transitions `pending -> active` on the first accepted bid.
    pub fn submit_bid(&mut self, new_bid: NewBid) -> Result<&Bid, AuctionError> {
        if self.status.is_terminal() || self.status == AuctionStatus::Clearing {
            return Err(AuctionError::AuctionEnded);
        }
        let tick = self.tick.0.fetch_add(1, Ordering::SeqCst);
        let bid = new_bid.accept(self.reserve_price, Timestamp(tick))?;
        self.bids.push(bid);
        if self.status == AuctionStatus::Pending {
            self.status = AuctionStatus::Active;
        }
        Ok(self.bids.last().expect("just pushed"))
    }

    pub fn cancel_bid(&mut self, bid_id: crate::ids::BidId) -> Result<(), AuctionError> {
        if self.status.is_terminal() || self.status == AuctionStatus::Clearing {
            return Err(AuctionError::AuctionEnded);
        }
        self.bids.retain(|b| b.bid_id != bid_id);
        Ok(())
    }

    pub fn begin_clearing(&mut self) {
        self.status = AuctionStatus::Clearing;
    }

    pub fn complete(&mut self, allocations: Vec<Allocation>) {
        self.winning_allocations = allocations;
        self.status = AuctionStatus::Completed;
    }

    pub fn cancel(&mut self) {
        self.status = AuctionStatus::Cancelled;
    }

    pub fn start(&mut self) {
        if self.status == AuctionStatus::Pending {
            self.status = AuctionStatus::Active;
        }
    }
}
