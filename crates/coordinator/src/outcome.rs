#[derive(Debug, Clone, PartialEq)]
pub enum CoordinationOutcome {
    Committed,
    Aborted(String),
    RolledBack(String),
}
