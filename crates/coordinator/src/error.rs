#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("participant {0} is not registered")]
    UnknownParticipant(model::ids::ParticipantId),
    #[error("unregister is only allowed for a non-active participant or an idle coordinator")]
    NotIdle,
    #[error("a transaction is already in flight")]
    TransactionInFlight,
    #[error("transport error talking to participant {0}: {1}")]
    Transport(model::ids::ParticipantId, String),
}
