//! The seven-member error taxonomy shared by every crate boundary.
//! Individual crates define narrower, local `thiserror` enums (e.g.
//! `clearing_engine::Error`) and convert into this one at their public API
//! surface.

use uuid::Uuid;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("stale: {0}")]
    Stale(String),
    #[error("transient: {0}")]
    Transient(String),
    #[error("circuit open, retry after {retry_after_ms}ms: {reason}")]
    CircuitOpen { reason: String, retry_after_ms: u64 },
    #[error("consensus failed: {0}")]
    ConsensusFailed(String),
    #[error("atomicity violation: {0}")]
    AtomicityViolation(String),
}

impl ErrorKind {
    /// Retry is advertised only for `Transient` (rate-limiting is modeled as
    /// `Transient` here — there is no separate rate-limiter subsystem in the
    /// core) and `CircuitOpen`.
    pub fn retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient(_) | ErrorKind::CircuitOpen { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput(_) => "invalid_input",
            ErrorKind::NotFound(_) => "not_found",
            ErrorKind::Stale(_) => "stale",
            ErrorKind::Transient(_) => "transient",
            ErrorKind::CircuitOpen { .. } => "circuit_open",
            ErrorKind::ConsensusFailed(_) => "consensus_failed",
            ErrorKind::AtomicityViolation(_) => "atomicity_violation",
        }
    }
}

/// Every failure surfaced across a component boundary carries a correlation
/// id and a machine-readable code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} (correlation_id={correlation_id})")]
pub struct EngineError {
    pub correlation_id: Uuid,
    pub kind: ErrorKind,
}

impl EngineError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn retryable(&self) -> bool {
        self.kind.retryable()
    }
}
