//! The settlement pipeline state machine:
//! `Prepared -> Improved -> Routed -> Voted -> Executing -> {Settled, RolledBack}`.
//!
//! This tracks a settlement's progress through the post-clearing pipeline;
//! it's distinct from [`model::AuctionStatus`], which tracks the auction's
//! own bid-intake lifecycle.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    Prepared,
    Improved,
    Routed,
    Voted,
    Executing,
    Settled,
    RolledBack,
}

impl SettlementState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SettlementState::Settled | SettlementState::RolledBack)
    }

    /// The only forward edges this machine admits. `Improved` is reachable
    /// only from `Prepared` (phantom improvement may be a no-op, but the
    /// state is still visited).
    fn can_advance_to(self, next: SettlementState) -> bool {
        use SettlementState::*;
        matches!(
            (self, next),
            (Prepared, Improved)
                | (Improved, Routed)
                | (Routed, Voted)
                | (Voted, Executing)
                | (Executing, Settled)
                | (Executing, RolledBack)
                | (Voted, RolledBack)
                | (Routed, RolledBack)
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub state: SettlementState,
    pub at: Instant,
}

#[derive(Debug, thiserror::Error)]
#[error("cannot transition from terminal state {from:?}")]
pub struct TerminalStateError {
    pub from: SettlementState,
}

#[derive(Debug, thiserror::Error)]
#[error("illegal transition {from:?} -> {to:?}")]
pub struct IllegalTransitionError {
    pub from: SettlementState,
    pub to: SettlementState,
}

/// A settlement's progress through the pipeline, with every transition
/// timestamped monotonically.
#[derive(Debug, Clone)]
pub struct SettlementProgress {
    history: Vec<Transition>,
}

impl SettlementProgress {
    pub fn new(now: Instant) -> Self {
        Self { history: vec![Transition { state: SettlementState::Prepared, at: now }] }
    }

    pub fn current(&self) -> SettlementState {
        self.history.last().expect("history is never empty").state
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn advance(&mut self, to: SettlementState, now: Instant) -> Result<(), AdvanceError> {
        let from = self.current();
        if from.is_terminal() {
            return Err(AdvanceError::Terminal(TerminalStateError { from }));
        }
        if !from.can_advance_to(to) {
            return Err(AdvanceError::Illegal(IllegalTransitionError { from, to }));
        }
        self.history.push(Transition { state: to, at: now });
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvanceError {
    #[error(transparent)]
    Terminal(#[from] TerminalStateError),
    #[error(transparent)]
    Illegal(#[from] IllegalTransitionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn walks_the_happy_path_to_settled() {
        let t0 = Instant::now();
        let mut progress = SettlementProgress::new(t0);
        progress.advance(SettlementState::Improved, t0 + Duration::from_millis(1)).unwrap();
        progress.advance(SettlementState::Routed, t0 + Duration::from_millis(2)).unwrap();
        progress.advance(SettlementState::Voted, t0 + Duration::from_millis(3)).unwrap();
        progress.advance(SettlementState::Executing, t0 + Duration::from_millis(4)).unwrap();
        progress.advance(SettlementState::Settled, t0 + Duration::from_millis(5)).unwrap();
        assert_eq!(progress.current(), SettlementState::Settled);
        assert_eq!(progress.history().len(), 6);
    }

    #[test]
    fn rejects_transitions_out_of_a_terminal_state() {
        let t0 = Instant::now();
        let mut progress = SettlementProgress::new(t0);
        progress.advance(SettlementState::Improved, t0).unwrap();
        progress.advance(SettlementState::Routed, t0).unwrap();
        progress.advance(SettlementState::RolledBack, t0).unwrap();
        let err = progress.advance(SettlementState::Voted, t0).unwrap_err();
        assert!(matches!(err, AdvanceError::Terminal(_)));
    }

    #[test]
    fn rejects_skipping_a_state() {
        let t0 = Instant::now();
        let mut progress = SettlementProgress::new(t0);
        let err = progress.advance(SettlementState::Voted, t0).unwrap_err();
        assert!(matches!(err, AdvanceError::Illegal(_)));
    }
}
