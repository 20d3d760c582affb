#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A non-monotonic supply curve is a configuration bug, not a runtime
    /// condition to recover from.
    #[error("supply schedule is not monotonically non-decreasing at price {price}")]
    NonMonotonicSupply { price: rust_decimal::Decimal },
}
