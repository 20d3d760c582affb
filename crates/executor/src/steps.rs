//! The saga's forward steps and their matching compensations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Validate,
    LockLiquidity,
    ExecuteSwaps,
    TransferTokens,
    UpdateReserves,
    RecordSettlements,
}

impl Step {
    pub const FORWARD_ORDER: [Step; 6] = [
        Step::Validate,
        Step::LockLiquidity,
        Step::ExecuteSwaps,
        Step::TransferTokens,
        Step::UpdateReserves,
        Step::RecordSettlements,
    ];
}

/// `true` means the caller may retry the whole batch (`max_retries`
/// permitting); `false` is a terminal failure.
#[derive(Debug, Clone)]
pub struct StepError {
    pub message: String,
    pub transient: bool,
}

impl StepError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: true }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self { message: message.into(), transient: false }
    }
}
