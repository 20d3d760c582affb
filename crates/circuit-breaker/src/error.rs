#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("circuit breaker is open")]
    Open,
    #[error("guarded operation failed")]
    OperationFailed,
}
