//! Re-exports the elastic supply curve math from `number`, wrapped with the
//! entity name the auction model uses.

use number::elasticity::SupplyCurve;
use rust_decimal::Decimal;

pub use number::elasticity::{ElasticityError, ElasticityType};

/// The elastic supply schedule `S(p)` an auction clears against.
pub type SupplySchedule = SupplyCurve;

/// `S(p)`.
pub fn available_supply(schedule: &SupplySchedule, price: Decimal) -> Decimal {
    schedule.quantity_at(price)
}
