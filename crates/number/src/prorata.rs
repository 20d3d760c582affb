//! Pro-rata and time-priority distribution helpers used by the augmented
//! tie-breaking rule.

use rust_decimal::Decimal;

/// Distributes `pool` proportionally across `quantities`, weighted by each
/// entry's own quantity. `Σ result <= pool` (equality unless `quantities` is
/// empty or all-zero).
pub fn distribute_pro_rata(pool: Decimal, quantities: &[Decimal]) -> Vec<Decimal> {
    let total: Decimal = quantities.iter().sum();
    if total <= Decimal::ZERO || pool <= Decimal::ZERO {
        return vec![Decimal::ZERO; quantities.len()];
    }
    quantities
        .iter()
        .map(|&q| pool * q / total)
        .collect()
}

/// Distributes `pool` by filling `quantities` fully, in the order given
/// (earliest-timestamp-first is the caller's responsibility), until
/// exhausted. `Σ result <= pool`.
pub fn distribute_time_priority(pool: Decimal, quantities: &[Decimal]) -> Vec<Decimal> {
    let mut remaining = pool.max(Decimal::ZERO);
    quantities
        .iter()
        .map(|&q| {
            let award = q.min(remaining).max(Decimal::ZERO);
            remaining -= award;
            award
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pro_rata_splits_proportionally() {
        let result = distribute_pro_rata(Decimal::new(250, 0), &[
            Decimal::new(400, 0),
            Decimal::new(400, 0),
            Decimal::new(400, 0),
        ]);
        for award in &result {
            assert_eq!(*award, Decimal::new(250, 0) / Decimal::new(3, 0));
        }
    }

    #[test]
    fn time_priority_fills_in_order() {
        let result = distribute_time_priority(Decimal::new(250, 0), &[
            Decimal::new(400, 0),
            Decimal::new(400, 0),
            Decimal::new(400, 0),
        ]);
        assert_eq!(result[0], Decimal::new(250, 0));
        assert_eq!(result[1], Decimal::ZERO);
        assert_eq!(result[2], Decimal::ZERO);
    }

    #[test]
    fn empty_pool_yields_zero_awards() {
        let result = distribute_pro_rata(Decimal::ZERO, &[Decimal::new(1, 0)]);
        assert_eq!(result, vec![Decimal::ZERO]);
    }
}
