//! The network boundary the coordinator talks through. Kept as a thin
//! `#[async_trait]` so production wiring (gRPC, an in-process channel, a
//! test double) are interchangeable, the same role `RouterBridge` plays for
//! the executor.

use async_trait::async_trait;
use model::{ids::ParticipantId, participant::Decision};

#[derive(Debug, Clone)]
pub struct Transaction {
    pub batch_id: model::ids::BatchId,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("participant did not respond in time")]
    Timeout,
    #[error("participant unreachable: {0}")]
    Unreachable(String),
}

#[cfg_attr(feature = "test-util", mockall::automock)]
#[async_trait]
pub trait ParticipantTransport: Send + Sync {
    async fn prepare(&self, participant: ParticipantId, tx: &Transaction) -> Result<Decision, TransportError>;
    async fn commit(&self, participant: ParticipantId, tx: &Transaction) -> Result<Decision, TransportError>;
    async fn abort(&self, participant: ParticipantId, tx: &Transaction);
    async fn rollback(&self, participant: ParticipantId, tx: &Transaction);
}

/// A reference transport for a single-node deployment: every registered
/// participant is assumed co-located and always votes yes. Real multi-node
/// wiring (gRPC, an in-process channel to an actual remote participant) is
/// out of scope here; this adapter just lets the coordinator run without
/// one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackTransport;

#[async_trait]
impl ParticipantTransport for LoopbackTransport {
    async fn prepare(&self, _participant: ParticipantId, _tx: &Transaction) -> Result<Decision, TransportError> {
        Ok(Decision::Yes)
    }

    async fn commit(&self, _participant: ParticipantId, _tx: &Transaction) -> Result<Decision, TransportError> {
        Ok(Decision::Yes)
    }

    async fn abort(&self, _participant: ParticipantId, _tx: &Transaction) {}

    async fn rollback(&self, _participant: ParticipantId, _tx: &Transaction) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_votes_yes() {
        let transport = LoopbackTransport;
        let tx = Transaction { batch_id: model::ids::BatchId::next() };
        let participant = model::ids::ParticipantId::next();
        assert_eq!(transport.prepare(participant, &tx).await.unwrap(), Decision::Yes);
        assert_eq!(transport.commit(participant, &tx).await.unwrap(), Decision::Yes);
    }
}
