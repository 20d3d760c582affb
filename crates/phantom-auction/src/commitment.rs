//! `commitment = H(bidder_id ∥ price ∥ quantity ∥ nonce)`.

use model::ids::BidderId;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

pub type Nonce = [u8; 32];
pub type Commitment = [u8; 32];

pub fn commit(bidder_id: BidderId, price: Decimal, quantity: Decimal, nonce: &Nonce) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(bidder_id.into_raw().to_be_bytes());
    hasher.update(price.to_string().as_bytes());
    hasher.update(quantity.to_string().as_bytes());
    hasher.update(nonce);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_commitment() {
        let nonce = [7u8; 32];
        let a = commit(BidderId::new(1), Decimal::new(100, 0), Decimal::new(5, 0), &nonce);
        let b = commit(BidderId::new(1), Decimal::new(100, 0), Decimal::new(5, 0), &nonce);
        assert_eq!(a, b);
    }

    #[test]
    fn different_price_produces_different_commitment() {
        let nonce = [7u8; 32];
        let a = commit(BidderId::new(1), Decimal::new(100, 0), Decimal::new(5, 0), &nonce);
        let b = commit(BidderId::new(1), Decimal::new(101, 0), Decimal::new(5, 0), &nonce);
        assert_ne!(a, b);
    }
}
