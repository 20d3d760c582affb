//! Newtype identifiers for the core entities.
//!
//! Ids are monotonic counters scoped to a single process; there is no
//! external id allocator here, just in-memory sequences.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

macro_rules! id_type {
    ($name:ident, $counter:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub fn next() -> Self {
                static $counter: AtomicU64 = AtomicU64::new(1);
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            pub const fn from_raw(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(BidId, BID_ID_COUNTER);
id_type!(AuctionId, AUCTION_ID_COUNTER);
id_type!(BidderId, BIDDER_ID_COUNTER);
id_type!(ParticipantId, PARTICIPANT_ID_COUNTER);
id_type!(BatchId, BATCH_ID_COUNTER);
id_type!(SettlementId, SETTLEMENT_ID_COUNTER);

impl BidderId {
    /// Bidder ids are supplied by the caller (they name an external party),
    /// never minted by the engine. `next()` is only used by test fixtures.
    pub const fn new(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}
