//! The Augmented Uniform-Price Auction: bids sorted into a canonical order,
//! walked against an elastic supply curve to find the clearing price, with
//! the marginal tier resolved by a pro-rata/time-priority tie-break.

pub mod error;
pub mod tie_break;

pub use error::Error;

use model::{Allocation, Bid, ClearingResult, SupplySchedule, TieBreaking, supply::available_supply};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Canonical ordering: `(price desc, timestamp asc, bid_id asc)`.
fn canonical_order(a: &Bid, b: &Bid) -> Ordering {
    b.price
        .cmp(&a.price)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.bid_id.cmp(&b.bid_id))
}

/// Runs the clearing algorithm over a snapshot of bids. Does not mutate the
/// auction; the orchestrator applies [`ClearingResult`] back via
/// `Auction::complete` — readers take an immutable snapshot at clearing time.
#[tracing::instrument(skip(bids, supply_schedule, tie_breaking))]
pub fn clear(
    bids: &[Bid],
    supply_schedule: &SupplySchedule,
    reserve_price: Decimal,
    tie_breaking: TieBreaking,
) -> Result<ClearingResult, Error> {
    supply_schedule
        .validate()
        .map_err(|_| Error::NonMonotonicSupply { price: supply_schedule.price_floor })?;

    if bids.is_empty() {
        return Ok(ClearingResult {
            clearing_price: reserve_price,
            allocations: Vec::new(),
            total_allocated: Decimal::ZERO,
            unfilled_demand: Decimal::ZERO,
        });
    }

    let mut sorted: Vec<&Bid> = bids.iter().collect();
    sorted.sort_by(|a, b| canonical_order(a, b));

    let mut cumulative = Decimal::ZERO;
    let mut idx = 0usize;
    let mut clearing_level: Option<(Decimal, Decimal, usize, usize)> = None; // (price, supply_at_price, tier_start, tier_end_exclusive)

    while idx < sorted.len() {
        let price = sorted[idx].price;
        let mut tier_end = idx;
        let mut tier_demand = Decimal::ZERO;
        while tier_end < sorted.len() && sorted[tier_end].price == price {
            tier_demand += sorted[tier_end].quantity;
            tier_end += 1;
        }
        let supply_at_price = available_supply(supply_schedule, price);
        let next_cumulative = cumulative + tier_demand;
        if next_cumulative >= supply_at_price {
            clearing_level = Some((price, supply_at_price, idx, tier_end));
            break;
        }
        cumulative = next_cumulative;
        idx = tier_end;
    }

    let Some((clearing_price, available, tier_start, tier_end)) = clearing_level else {
        // Demand never reaches S(price_floor): everyone clears fully at
        // max(price_floor, reserve_price).
        let clearing_price = supply_schedule.price_floor.max(reserve_price);
        let allocations = sorted
            .iter()
            .map(|bid| Allocation {
                bid_id: bid.bid_id,
                bidder_id: bid.bidder_id,
                allocated_quantity: bid.quantity,
                clearing_price,
                pro_rata_share: None,
                time_priority_rank: None,
            })
            .collect::<Vec<_>>();
        let total_allocated: Decimal = allocations.iter().map(|a| a.allocated_quantity).sum();
        return Ok(ClearingResult {
            clearing_price,
            total_allocated,
            unfilled_demand: Decimal::ZERO,
            allocations,
        });
    };

    let mut allocations = Vec::with_capacity(sorted.len());

    // Bids strictly above the clearing price fill completely.
    for bid in &sorted[..tier_start] {
        allocations.push(Allocation {
            bid_id: bid.bid_id,
            bidder_id: bid.bidder_id,
            allocated_quantity: bid.quantity,
            clearing_price,
            pro_rata_share: None,
            time_priority_rank: None,
        });
    }

    // The rationed tier at exactly the clearing price.
    let tied: Vec<Bid> = sorted[tier_start..tier_end].iter().map(|b| (*b).clone()).collect();
    let remaining_supply = (available - cumulative).max(Decimal::ZERO);
    let awards = tie_break::resolve(
        &tied,
        remaining_supply,
        tie_breaking.pro_rata_weight,
        tie_breaking.time_priority_weight,
    );
    for (bid, award) in tied.iter().zip(awards.iter()) {
        allocations.push(Allocation {
            bid_id: bid.bid_id,
            bidder_id: bid.bidder_id,
            allocated_quantity: award.award,
            clearing_price,
            pro_rata_share: Some(award.pro_rata_share),
            time_priority_rank: Some(award.time_priority_rank),
        });
    }

    let total_allocated: Decimal = allocations.iter().map(|a| a.allocated_quantity).sum();
    let total_demand: Decimal = bids.iter().map(|b| b.quantity).sum();
    let unfilled_demand = (total_demand - total_allocated).max(Decimal::ZERO);

    Ok(ClearingResult {
        clearing_price,
        allocations,
        total_allocated,
        unfilled_demand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Timestamp, ids::BidderId, supply::ElasticityType};

    fn flat_supply(base: i64) -> SupplySchedule {
        SupplySchedule {
            base_quantity: Decimal::new(base, 0),
            price_floor: Decimal::new(10, 0),
            price_ceiling: Decimal::new(10, 0),
            elasticity_type: ElasticityType::Linear,
            elasticity_factor: Decimal::ZERO,
            max_multiplier: Decimal::ONE,
        }
    }

    fn bid(id: u64, bidder: u64, qty: i64, price: i64, ts: u64) -> Bid {
        Bid {
            bid_id: model::ids::BidId::from_raw(id),
            bidder_id: BidderId::new(bidder),
            quantity: Decimal::new(qty, 0),
            price: Decimal::new(price, 0),
            timestamp: Timestamp(ts),
            is_marginal: false,
            min_quantity: None,
            metadata: Default::default(),
        }
    }

    fn equal_split() -> TieBreaking {
        TieBreaking::new(Decimal::new(5, 1), Decimal::new(5, 1)).unwrap()
    }

    #[test]
    fn empty_bid_set_returns_reserve_price_with_no_allocations() {
        let result = clear(&[], &flat_supply(1000), Decimal::new(10, 0), equal_split()).unwrap();
        assert_eq!(result.clearing_price, Decimal::new(10, 0));
        assert!(result.allocations.is_empty());
    }

    /// No ties, uniform clearing.
    #[test]
    fn uniform_clearing_no_ties() {
        let bids = vec![
            bid(1, 1, 500, 60, 0),
            bid(2, 2, 600, 55, 1),
            bid(3, 3, 300, 50, 2),
        ];
        let result = clear(&bids, &flat_supply(1000), Decimal::new(10, 0), equal_split()).unwrap();
        assert_eq!(result.clearing_price, Decimal::new(55, 0));
        let by_id = |id: u64| {
            result
                .allocations
                .iter()
                .find(|a| a.bid_id == model::ids::BidId::from_raw(id))
                .unwrap()
        };
        assert_eq!(by_id(1).allocated_quantity, Decimal::new(500, 0));
        assert_eq!(by_id(2).allocated_quantity, Decimal::new(500, 0));
        assert!(result.allocations.iter().all(|a| a.bid_id != model::ids::BidId::from_raw(3)) || by_id(3).allocated_quantity == Decimal::ZERO);
        assert_eq!(result.total_allocated, Decimal::new(1000, 0));
    }

    /// Pro-rata + time-priority tie at the clearing price.
    #[test]
    fn uniform_clearing_with_pro_rata_tie() {
        let bids = vec![
            bid(1, 1, 400, 50, 0),
            bid(2, 2, 400, 50, 1),
            bid(3, 3, 400, 50, 2),
            bid(4, 4, 500, 60, 3),
        ];
        let result = clear(&bids, &flat_supply(1000), Decimal::new(10, 0), equal_split()).unwrap();
        assert_eq!(result.clearing_price, Decimal::new(50, 0));
        let by_id = |id: u64| {
            result
                .allocations
                .iter()
                .find(|a| a.bid_id == model::ids::BidId::from_raw(id))
                .unwrap()
        };
        assert_eq!(by_id(4).allocated_quantity, Decimal::new(500, 0));
        // Remaining 500 split: pro-rata 250 -> 83.33 each, time-priority 250 -> bid 1 only.
        let a = by_id(1).allocated_quantity;
        let b = by_id(2).allocated_quantity;
        let c = by_id(3).allocated_quantity;
        assert_eq!(b, c);
        assert!(a > b);
        // 250/3 is a repeating decimal, so the three pro-rata shares don't
        // sum back to exactly 250; allow the rounding residual.
        assert!((a + b + c - Decimal::new(500, 0)).abs() < Decimal::new(1, 10));
    }

    #[test]
    fn exact_tie_on_price_and_timestamp_broken_by_bid_id() {
        let bids = vec![bid(2, 1, 100, 50, 0), bid(1, 2, 100, 50, 0)];
        let mut sorted = bids.clone();
        sorted.sort_by(canonical_order);
        assert_eq!(sorted[0].bid_id, model::ids::BidId::from_raw(1));
        assert_eq!(sorted[1].bid_id, model::ids::BidId::from_raw(2));
    }

    #[test]
    fn allocations_never_exceed_requested_quantity() {
        let bids = vec![bid(1, 1, 400, 50, 0), bid(2, 2, 400, 50, 1)];
        let result = clear(&bids, &flat_supply(500), Decimal::new(10, 0), equal_split()).unwrap();
        for allocation in &result.allocations {
            let requested = bids.iter().find(|b| b.bid_id == allocation.bid_id).unwrap().quantity;
            assert!(allocation.allocated_quantity <= requested);
        }
    }
}
