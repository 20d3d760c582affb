pub mod builders;
pub mod clock;

pub use builders::{AuctionBuilder, BidBuilder};
pub use clock::TestClock;
