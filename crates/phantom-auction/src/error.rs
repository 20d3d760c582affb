#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("commit window has closed")]
    CommitWindowClosed,
    #[error("reveal window is not open yet")]
    RevealWindowNotOpen,
    #[error("reveal window has closed")]
    RevealWindowClosed,
    #[error("no commitment found for this bidder")]
    UnknownBidder,
    #[error("revealed value does not match the stored commitment")]
    CommitmentMismatch,
    #[error("bidder has already revealed once")]
    DuplicateReveal,
}
