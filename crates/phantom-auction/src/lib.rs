//! The sealed-bid phantom auction: a multi-bidder commit-reveal round with
//! its own deadline-bounded windows, run after clearing to see if bidders
//! will improve on the clearing price.

pub mod commitment;
pub mod config;
pub mod error;
pub mod mechanism;

pub use config::PhantomAuctionArgs;
pub use error::Error;
pub use mechanism::PhantomMechanism;

use model::{bid::Timestamp, ids::BidderId};
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::Instant,
};

#[derive(Debug, Clone)]
struct Revealed {
    price: Decimal,
    quantity: Decimal,
}

/// The outcome of a resolved phantom auction.
#[derive(Debug, Clone, PartialEq)]
pub struct ImprovedPrice {
    pub price: Decimal,
    pub winners: Vec<BidderId>,
    pub mechanism: PhantomMechanism,
}

/// Runs one commit-reveal round. Created fresh per clearing round; not
/// reused across rounds (commitments from a previous round must not leak
/// into the next).
pub struct PhantomAuction {
    config: PhantomAuctionArgs,
    started_at: Instant,
    commitments: Mutex<HashMap<BidderId, commitment::Commitment>>,
    revealed: Mutex<HashMap<BidderId, Revealed>>,
}

impl PhantomAuction {
    pub fn new(config: PhantomAuctionArgs, started_at: Instant) -> Self {
        Self {
            config,
            started_at,
            commitments: Mutex::new(HashMap::new()),
            revealed: Mutex::new(HashMap::new()),
        }
    }

    pub fn reveal_window_starts_at(&self) -> Instant {
        self.started_at + self.config.duration.saturating_sub(self.config.reveal_delay)
    }

    pub fn deadline(&self) -> Instant {
        self.started_at + self.config.duration
    }

    /// Accepts a sealed commitment. Prices are never inspected here.
    pub fn commit(&self, bidder_id: BidderId, commitment: commitment::Commitment, now: Instant) -> Result<(), Error> {
        if now >= self.reveal_window_starts_at() {
            return Err(Error::CommitWindowClosed);
        }
        self.commitments.lock().unwrap().insert(bidder_id, commitment);
        Ok(())
    }

    /// Accepts a reveal matching a previously stored commitment. The first
    /// reveal for a bidder wins; a later reveal for the same bidder (e.g. a
    /// retried message) is rejected rather than silently overwriting it.
    pub fn reveal(
        &self,
        bidder_id: BidderId,
        price: Decimal,
        quantity: Decimal,
        nonce: commitment::Nonce,
        now: Instant,
    ) -> Result<(), Error> {
        if now < self.reveal_window_starts_at() {
            return Err(Error::RevealWindowNotOpen);
        }
        if now >= self.deadline() {
            return Err(Error::RevealWindowClosed);
        }

        let mut revealed = self.revealed.lock().unwrap();
        if revealed.contains_key(&bidder_id) {
            return Err(Error::DuplicateReveal);
        }

        let commitments = self.commitments.lock().unwrap();
        let expected = commitments.get(&bidder_id).ok_or(Error::UnknownBidder)?;
        if &commitment::commit(bidder_id, price, quantity, &nonce) != expected {
            return Err(Error::CommitmentMismatch);
        }

        revealed.insert(bidder_id, Revealed { price, quantity });
        Ok(())
    }

    /// Resolves the auction from the bids revealed so far. Callers are
    /// expected to invoke this only after [`Self::deadline`] has passed;
    /// resolving early just means fewer reveals are counted.
    pub fn resolve(&self, base_price: Decimal, base_quantity: Decimal) -> Option<ImprovedPrice> {
        let revealed = self.revealed.lock().unwrap();
        if revealed.len() < self.config.min_participants as usize {
            return None;
        }

        let mut bids: Vec<(BidderId, Revealed)> = revealed.iter().map(|(id, r)| (*id, r.clone())).collect();
        bids.sort_by(|a, b| b.1.price.cmp(&a.1.price));

        let (clearing_price, winners) = match self.config.mechanism {
            PhantomMechanism::Vickrey => {
                let winner = bids[0].0;
                let pay = bids.get(1).map(|(_, r)| r.price).unwrap_or(base_price);
                (pay, vec![winner])
            }
            PhantomMechanism::Uniform => {
                let mut cumulative = Decimal::ZERO;
                let mut clearing = base_price;
                let mut winners = Vec::new();
                for (bidder_id, r) in &bids {
                    cumulative += r.quantity;
                    winners.push(*bidder_id);
                    clearing = r.price;
                    if cumulative >= base_quantity {
                        break;
                    }
                }
                (clearing, winners)
            }
            PhantomMechanism::Discriminatory => {
                let mut cumulative = Decimal::ZERO;
                let mut weighted_sum = Decimal::ZERO;
                let mut winners = Vec::new();
                for (bidder_id, r) in &bids {
                    cumulative += r.quantity;
                    weighted_sum += r.price * r.quantity;
                    winners.push(*bidder_id);
                    if cumulative >= base_quantity {
                        break;
                    }
                }
                let average = if cumulative > Decimal::ZERO {
                    weighted_sum / cumulative
                } else {
                    base_price
                };
                (average, winners)
            }
        };

        let min_accept = base_price * (Decimal::ONE + Decimal::new(self.config.min_improvement_bps as i64, 4));
        let max_accept = base_price * (Decimal::ONE + Decimal::new(self.config.max_improvement_bps as i64, 4));
        if clearing_price < min_accept || clearing_price > max_accept {
            return None;
        }

        Some(ImprovedPrice {
            price: clearing_price,
            winners,
            mechanism: self.config.mechanism,
        })
    }
}

/// Derives the monotonic timestamp a reveal should be recorded under, for
/// callers that want to fold phantom bids back into the main bid ledger.
pub fn tick_since(started_at: Instant, now: Instant) -> Timestamp {
    Timestamp(now.saturating_duration_since(started_at).as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> PhantomAuctionArgs {
        PhantomAuctionArgs {
            duration: Duration::from_millis(500),
            reveal_delay: Duration::from_millis(150),
            min_improvement_bps: 10,
            max_improvement_bps: 500,
            min_participants: 2,
            mechanism: PhantomMechanism::Uniform,
        }
    }

    fn nonce(byte: u8) -> commitment::Nonce {
        [byte; 32]
    }

    #[test]
    fn full_commit_reveal_round_trip_improves_price() {
        let started_at = Instant::now();
        let auction = PhantomAuction::new(config(), started_at);

        let alice = BidderId::new(1);
        let bob = BidderId::new(2);
        let alice_nonce = nonce(1);
        let bob_nonce = nonce(2);
        let alice_price = Decimal::new(105, 0);
        let bob_price = Decimal::new(110, 0);
        let qty = Decimal::new(50, 0);

        let commit_time = started_at + Duration::from_millis(50);
        auction
            .commit(alice, commitment::commit(alice, alice_price, qty, &alice_nonce), commit_time)
            .unwrap();
        auction
            .commit(bob, commitment::commit(bob, bob_price, qty, &bob_nonce), commit_time)
            .unwrap();

        let reveal_time = started_at + Duration::from_millis(400);
        auction.reveal(alice, alice_price, qty, alice_nonce, reveal_time).unwrap();
        auction.reveal(bob, bob_price, qty, bob_nonce, reveal_time).unwrap();

        let result = auction.resolve(Decimal::new(100, 0), Decimal::new(80, 0)).unwrap();
        assert_eq!(result.winners.len(), 2);
        assert!(result.price > Decimal::new(100, 0));
    }

    #[test]
    fn reveal_with_wrong_price_is_rejected() {
        let started_at = Instant::now();
        let auction = PhantomAuction::new(config(), started_at);
        let alice = BidderId::new(1);
        let alice_nonce = nonce(1);
        let qty = Decimal::new(10, 0);
        let committed_price = Decimal::new(105, 0);

        auction
            .commit(alice, commitment::commit(alice, committed_price, qty, &alice_nonce), started_at + Duration::from_millis(10))
            .unwrap();

        let wrong_price = Decimal::new(999, 0);
        let result = auction.reveal(alice, wrong_price, qty, alice_nonce, started_at + Duration::from_millis(400));
        assert_eq!(result, Err(Error::CommitmentMismatch));
    }

    #[test]
    fn second_reveal_for_same_bidder_is_rejected() {
        let started_at = Instant::now();
        let auction = PhantomAuction::new(config(), started_at);
        let alice = BidderId::new(1);
        let alice_nonce = nonce(1);
        let qty = Decimal::new(10, 0);
        let price = Decimal::new(105, 0);

        auction
            .commit(alice, commitment::commit(alice, price, qty, &alice_nonce), started_at + Duration::from_millis(10))
            .unwrap();
        auction.reveal(alice, price, qty, alice_nonce, started_at + Duration::from_millis(400)).unwrap();
        let second = auction.reveal(alice, price, qty, alice_nonce, started_at + Duration::from_millis(410));
        assert_eq!(second, Err(Error::DuplicateReveal));
    }

    #[test]
    fn below_quorum_yields_none() {
        let started_at = Instant::now();
        let auction = PhantomAuction::new(config(), started_at);
        let alice = BidderId::new(1);
        let alice_nonce = nonce(1);
        let qty = Decimal::new(10, 0);
        let price = Decimal::new(105, 0);

        auction
            .commit(alice, commitment::commit(alice, price, qty, &alice_nonce), started_at + Duration::from_millis(10))
            .unwrap();
        auction.reveal(alice, price, qty, alice_nonce, started_at + Duration::from_millis(400)).unwrap();

        assert_eq!(auction.resolve(Decimal::new(100, 0), Decimal::new(80, 0)), None);
    }

    #[test]
    fn improvement_below_minimum_bps_is_rejected() {
        let started_at = Instant::now();
        let auction = PhantomAuction::new(config(), started_at);
        let alice = BidderId::new(1);
        let bob = BidderId::new(2);
        let alice_nonce = nonce(1);
        let bob_nonce = nonce(2);
        let qty = Decimal::new(10, 0);
        // Both reveal at exactly base_price: 0 bps improvement, below the
        // configured min_improvement_bps of 10.
        let price = Decimal::new(100, 0);

        auction
            .commit(alice, commitment::commit(alice, price, qty, &alice_nonce), started_at + Duration::from_millis(10))
            .unwrap();
        auction
            .commit(bob, commitment::commit(bob, price, qty, &bob_nonce), started_at + Duration::from_millis(10))
            .unwrap();
        auction.reveal(alice, price, qty, alice_nonce, started_at + Duration::from_millis(400)).unwrap();
        auction.reveal(bob, price, qty, bob_nonce, started_at + Duration::from_millis(400)).unwrap();

        assert_eq!(auction.resolve(Decimal::new(100, 0), Decimal::new(5, 0)), None);
    }
}
