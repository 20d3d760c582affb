//! The elastic supply schedule `S(p)`.
//!
//! `S` must be monotonically non-decreasing on `[price_floor, price_ceiling]`,
//! `S(price_floor) == base_quantity`, and `S(p) <= base_quantity *
//! max_multiplier` for all `p`. All four curve shapes below are built from a
//! normalized progress variable `t = clamp((p - floor) / (ceiling - floor),
//! 0, 1)` so that the boundary invariants hold regardless of curve shape or
//! of the caller-supplied `elasticity_factor`.

use rust_decimal::{Decimal, MathematicalOps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElasticityType {
    Linear,
    Exponential,
    Logarithmic,
    Sigmoid,
}

#[derive(Debug, thiserror::Error)]
pub enum ElasticityError {
    #[error("price_ceiling must be >= price_floor")]
    InvertedBounds,
    #[error("max_multiplier must be >= 1")]
    InvalidMultiplier,
}

/// Parameters of `S(p)`.
#[derive(Debug, Clone, Copy)]
pub struct SupplyCurve {
    pub base_quantity: Decimal,
    pub price_floor: Decimal,
    pub price_ceiling: Decimal,
    pub elasticity_type: ElasticityType,
    pub elasticity_factor: Decimal,
    pub max_multiplier: Decimal,
}

impl SupplyCurve {
    pub fn validate(&self) -> Result<(), ElasticityError> {
        if self.price_ceiling < self.price_floor {
            return Err(ElasticityError::InvertedBounds);
        }
        if self.max_multiplier < Decimal::ONE {
            return Err(ElasticityError::InvalidMultiplier);
        }
        Ok(())
    }

    /// Normalized progress of `p` between `price_floor` and `price_ceiling`,
    /// clamped to `[0, 1]`. Prices below the floor or above a degenerate
    /// (zero-width) band are treated as the boundary.
    fn progress(&self, price: Decimal) -> Decimal {
        let width = self.price_ceiling - self.price_floor;
        if width <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((price - self.price_floor) / width).clamp(Decimal::ZERO, Decimal::ONE)
    }

    /// `S(p)`: available quantity at price `p`.
    pub fn quantity_at(&self, price: Decimal) -> Decimal {
        let t = self.progress(price);
        let headroom = self.base_quantity * (self.max_multiplier - Decimal::ONE);
        let growth = match self.elasticity_type {
            ElasticityType::Linear => t,
            ElasticityType::Exponential => exponential_growth(t, self.elasticity_factor),
            ElasticityType::Logarithmic => logarithmic_growth(t, self.elasticity_factor),
            ElasticityType::Sigmoid => sigmoid_growth(t, self.elasticity_factor),
        };
        let supply = self.base_quantity + headroom * growth;
        // growth is mathematically confined to [0, 1], but clamp defensively
        // against accumulated rounding so the invariant never trips on ε.
        supply.clamp(self.base_quantity, self.base_quantity * self.max_multiplier)
    }
}

/// `(max_multiplier^t - 1) / (max_multiplier - 1)`-style growth would require
/// carrying `max_multiplier` in here too; instead we normalize a plain
/// exponential `factor^t` against its own endpoints so the shape is
/// controlled by `factor` alone and the 0..1 range always lands exactly on
/// the boundaries.
fn exponential_growth(t: Decimal, factor: Decimal) -> Decimal {
    let base = if factor > Decimal::ONE {
        factor
    } else {
        Decimal::new(2, 0)
    };
    let numerator = powd(base, t) - Decimal::ONE;
    let denominator = base - Decimal::ONE;
    if denominator == Decimal::ZERO {
        t
    } else {
        numerator / denominator
    }
}

fn logarithmic_growth(t: Decimal, factor: Decimal) -> Decimal {
    let factor = if factor > Decimal::ZERO {
        factor
    } else {
        Decimal::ONE
    };
    let numerator = (Decimal::ONE + factor * t).ln();
    let denominator = (Decimal::ONE + factor).ln();
    if denominator == Decimal::ZERO {
        t
    } else {
        numerator / denominator
    }
}

fn sigmoid_growth(t: Decimal, factor: Decimal) -> Decimal {
    let factor = if factor > Decimal::ZERO {
        factor
    } else {
        Decimal::new(6, 0)
    };
    let half = Decimal::new(5, 1); // 0.5
    let sig = |x: Decimal| Decimal::ONE / (Decimal::ONE + (-factor * (x - half)).exp());
    let s0 = sig(Decimal::ZERO);
    let s1 = sig(Decimal::ONE);
    let st = sig(t);
    if s1 == s0 {
        t
    } else {
        (st - s0) / (s1 - s0)
    }
}

/// `base^exp` for a non-negative decimal exponent, via `ln`/`exp` since
/// `rust_decimal`'s `powd` is only defined for this combination in recent
/// versions; implemented directly so the crate's `MathematicalOps`
/// dependency surface is small and explicit.
fn powd(base: Decimal, exp: Decimal) -> Decimal {
    if exp == Decimal::ZERO {
        return Decimal::ONE;
    }
    (exp * base.ln()).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(ty: ElasticityType) -> SupplyCurve {
        SupplyCurve {
            base_quantity: Decimal::new(1000, 0),
            price_floor: Decimal::new(10, 0),
            price_ceiling: Decimal::new(100, 0),
            elasticity_type: ty,
            elasticity_factor: Decimal::new(2, 0),
            max_multiplier: Decimal::new(3, 0),
        }
    }

    #[test]
    fn floor_equals_base_quantity_for_every_shape() {
        for ty in [
            ElasticityType::Linear,
            ElasticityType::Exponential,
            ElasticityType::Logarithmic,
            ElasticityType::Sigmoid,
        ] {
            let c = curve(ty);
            assert_eq!(c.quantity_at(c.price_floor), c.base_quantity, "{ty:?}");
        }
    }

    #[test]
    fn never_exceeds_base_times_max_multiplier() {
        for ty in [
            ElasticityType::Linear,
            ElasticityType::Exponential,
            ElasticityType::Logarithmic,
            ElasticityType::Sigmoid,
        ] {
            let c = curve(ty);
            let cap = c.base_quantity * c.max_multiplier;
            for p in [0, 10, 20, 50, 80, 100, 150] {
                let q = c.quantity_at(Decimal::new(p, 0));
                assert!(q <= cap, "{ty:?} at {p}: {q} > {cap}");
                assert!(q >= c.base_quantity, "{ty:?} at {p}: {q} < base");
            }
        }
    }

    #[test]
    fn monotonically_non_decreasing() {
        for ty in [
            ElasticityType::Linear,
            ElasticityType::Exponential,
            ElasticityType::Logarithmic,
            ElasticityType::Sigmoid,
        ] {
            let c = curve(ty);
            let mut prev = c.quantity_at(c.price_floor);
            for p in 10..=100 {
                let q = c.quantity_at(Decimal::new(p, 0));
                assert!(q >= prev, "{ty:?} dropped at {p}: {q} < {prev}");
                prev = q;
            }
        }
    }

    #[test]
    fn zero_width_band_is_flat_at_base() {
        let mut c = curve(ElasticityType::Sigmoid);
        c.price_ceiling = c.price_floor;
        assert_eq!(c.quantity_at(c.price_floor), c.base_quantity);
        assert_eq!(c.quantity_at(Decimal::new(1000, 0)), c.base_quantity);
    }
}
