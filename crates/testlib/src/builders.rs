//! Fixture builders for the core entities: small `with_*` chains instead of
//! arbitrary struct literals scattered through tests.

use model::{
    Mechanism, SupplySchedule, TieBreaking,
    auction::Auction,
    bid::NewBid,
    ids::BidderId,
    supply::ElasticityType,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub struct AuctionBuilder {
    mechanism: Mechanism,
    reserve_price: Decimal,
    base_quantity: Decimal,
    price_floor: Decimal,
    price_ceiling: Decimal,
    elasticity_type: ElasticityType,
    elasticity_factor: Decimal,
    max_multiplier: Decimal,
    pro_rata_weight: Decimal,
    time_priority_weight: Decimal,
}

impl Default for AuctionBuilder {
    fn default() -> Self {
        Self {
            mechanism: Mechanism::Augmented,
            reserve_price: Decimal::new(10, 0),
            base_quantity: Decimal::new(1000, 0),
            price_floor: Decimal::new(10, 0),
            price_ceiling: Decimal::new(100, 0),
            elasticity_type: ElasticityType::Linear,
            elasticity_factor: Decimal::ZERO,
            max_multiplier: Decimal::ONE,
            pro_rata_weight: Decimal::new(5, 1),
            time_priority_weight: Decimal::new(5, 1),
        }
    }
}

impl AuctionBuilder {
    pub fn with_reserve_price(mut self, price: impl Into<Decimal>) -> Self {
        self.reserve_price = price.into();
        self
    }

    pub fn with_base_quantity(mut self, quantity: impl Into<Decimal>) -> Self {
        self.base_quantity = quantity.into();
        self
    }

    pub fn with_tie_breaking(mut self, pro_rata_weight: Decimal, time_priority_weight: Decimal) -> Self {
        self.pro_rata_weight = pro_rata_weight;
        self.time_priority_weight = time_priority_weight;
        self
    }

    pub fn with_elasticity(mut self, ty: ElasticityType, factor: Decimal, max_multiplier: Decimal) -> Self {
        self.elasticity_type = ty;
        self.elasticity_factor = factor;
        self.max_multiplier = max_multiplier;
        self
    }

    pub fn build(self) -> Auction {
        let supply_schedule = SupplySchedule {
            base_quantity: self.base_quantity,
            price_floor: self.price_floor,
            price_ceiling: self.price_ceiling,
            elasticity_type: self.elasticity_type,
            elasticity_factor: self.elasticity_factor,
            max_multiplier: self.max_multiplier,
        };
        let tie_breaking = TieBreaking::new(self.pro_rata_weight, self.time_priority_weight)
            .expect("fixture weights must be valid");
        Auction::new(self.mechanism, self.reserve_price, supply_schedule, tie_breaking)
    }
}

pub struct BidBuilder {
    bidder_id: u64,
    quantity: Decimal,
    price: Decimal,
    is_marginal: bool,
    min_quantity: Option<Decimal>,
}

impl BidBuilder {
    pub fn new(bidder_id: u64, quantity: impl Into<Decimal>, price: impl Into<Decimal>) -> Self {
        Self {
            bidder_id,
            quantity: quantity.into(),
            price: price.into(),
            is_marginal: false,
            min_quantity: None,
        }
    }

    pub fn marginal(mut self, min_quantity: impl Into<Decimal>) -> Self {
        self.is_marginal = true;
        self.min_quantity = Some(min_quantity.into());
        self
    }

    pub fn build(self) -> NewBid {
        NewBid {
            bidder_id: BidderId::new(self.bidder_id),
            quantity: self.quantity,
            price: self.price,
            is_marginal: self.is_marginal,
            min_quantity: self.min_quantity,
            metadata: HashMap::new(),
        }
    }
}
