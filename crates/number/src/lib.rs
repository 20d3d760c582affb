//! Decimal-precision numeric helpers shared across the auction core.
//!
//! This core has no on-chain amounts to convert — prices and quantities are
//! represented as `rust_decimal::Decimal` throughout, crossing to `f64` only
//! at the API boundary — so this crate hosts the elasticity curve and
//! pro-rata distribution math shared by `clearing-engine` and
//! `phantom-auction`.

pub mod elasticity;
pub mod prorata;
