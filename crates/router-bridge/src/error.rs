#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("venue rejected quote: {0}")]
    QuoteRejected(String),
    #[error("route went stale before execution")]
    StaleRoute,
    #[error("venue unreachable: {0}")]
    Unreachable(String),
    #[error("venue returned an unexpected response: {0}")]
    Protocol(String),
}
