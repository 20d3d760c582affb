//! The settlement coordinator: weighted-threshold two-phase commit over the
//! participants in a [`registry::ParticipantRegistry`].

pub mod config;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod transport;

pub use config::CoordinatorArgs;
pub use error::Error;
pub use outcome::CoordinationOutcome;
pub use registry::ParticipantRegistry;
pub use transport::{LoopbackTransport, ParticipantTransport, Transaction, TransportError};

use futures::stream::{FuturesUnordered, StreamExt};
use model::{
    ids::ParticipantId,
    participant::{Decision, Phase, Vote},
};
use std::{
    collections::HashMap,
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    time::{Duration, Instant},
};
use tokio::sync::Mutex as AsyncMutex;

pub struct Coordinator<T: ParticipantTransport> {
    config: CoordinatorArgs,
    registry: ParticipantRegistry,
    transport: T,
    in_flight: AsyncMutex<()>,
    aborting: AtomicBool,
}

impl<T: ParticipantTransport> Coordinator<T> {
    pub fn new(config: CoordinatorArgs, registry: ParticipantRegistry, transport: T) -> Self {
        Self {
            config,
            registry,
            transport,
            in_flight: AsyncMutex::new(()),
            aborting: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Signals outstanding vote collectors to stop waiting early. Best
    /// effort: a transport call already dispatched is not itself cancelled,
    /// but its result is ignored once this fires.
    pub fn cancel(&self) {
        self.aborting.store(true, Ordering::SeqCst);
    }

    #[tracing::instrument(skip(self, tx))]
    pub async fn coordinate(&self, tx: &Transaction) -> CoordinationOutcome {
        // "Concurrent coordinate calls are serialized; the coordinator holds
        // one transaction in flight at a time."
        let _guard = self.in_flight.lock().await;
        self.aborting.store(false, Ordering::SeqCst);

        let mut attempt = 0u32;
        let mut last_active = Vec::new();
        let prepare_outcome = loop {
            if self.aborting.load(Ordering::SeqCst) {
                break Err("cancelled before prepare completed".to_string());
            }

            let now = Instant::now();
            let active = self.registry.active_participants(
                now,
                self.config.heartbeat_interval,
                self.config.heartbeat_multiplier,
            );
            let votes = self
                .collect_votes(&active, Phase::Prepare, self.config.prepare_timeout, tx)
                .await;
            let (ratio, total_weight) = weighted_yes_ratio(&active, &votes);
            last_active = active.clone();

            if total_weight > 0.0 && ratio >= self.config.consensus_threshold {
                break Ok(active);
            }

            let any_explicit_no = votes.values().any(|d| *d == Decision::No);
            let transient = !any_explicit_no;

            if transient && attempt < self.config.retry_count {
                attempt += 1;
                continue;
            }

            break Err(format!("prepare consensus not reached: ratio {ratio:.2} < threshold {}", self.config.consensus_threshold));
        };

        let active = match prepare_outcome {
            Ok(active) => active,
            Err(reason) => {
                for participant in &last_active {
                    self.transport.abort(participant.participant_id, tx).await;
                }
                return CoordinationOutcome::Aborted(reason);
            }
        };

        if self.aborting.load(Ordering::SeqCst) {
            for participant_id in active.iter().map(|p| p.participant_id) {
                self.transport.abort(participant_id, tx).await;
            }
            return CoordinationOutcome::Aborted("cancelled before commit".to_string());
        }

        let commit_votes = self.collect_votes(&active, Phase::Commit, self.config.commit_timeout, tx).await;
        let (commit_ratio, commit_weight) = weighted_yes_ratio(&active, &commit_votes);

        if commit_weight > 0.0 && commit_ratio >= self.config.consensus_threshold {
            CoordinationOutcome::Committed
        } else {
            for participant in &active {
                self.transport.rollback(participant.participant_id, tx).await;
            }
            CoordinationOutcome::RolledBack(format!(
                "commit consensus not reached: ratio {commit_ratio:.2} < threshold {}",
                self.config.consensus_threshold
            ))
        }
    }

    async fn collect_votes(
        &self,
        active: &[Arc<model::participant::Participant>],
        phase: Phase,
        timeout: Duration,
        tx: &Transaction,
    ) -> HashMap<ParticipantId, Decision> {
        let mut pending = FuturesUnordered::new();
        for participant in active {
            let participant_id = participant.participant_id;
            pending.push(async move {
                let result = match phase {
                    Phase::Prepare => self.transport.prepare(participant_id, tx).await,
                    Phase::Commit => self.transport.commit(participant_id, tx).await,
                };
                (participant_id, result)
            });
        }

        let mut votes = HashMap::new();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                next = pending.next() => {
                    match next {
                        Some((participant_id, Ok(decision))) => {
                            if let Some(participant) = active.iter().find(|p| p.participant_id == participant_id) {
                                participant.record_vote(Vote {
                                    participant_id,
                                    phase,
                                    decision,
                                    reason: None,
                                    received_at: Instant::now(),
                                });
                            }
                            votes.insert(participant_id, decision);
                        }
                        Some((_, Err(_))) => {}
                        None => break,
                    }
                }
            }
        }
        votes
    }
}

/// `r = Σ weight(p) · [vote(p) = yes] / Σ weight(p active)`. A missing vote
/// counts as `no` by simply not contributing to the numerator.
fn weighted_yes_ratio(active: &[Arc<model::participant::Participant>], votes: &HashMap<ParticipantId, Decision>) -> (f64, f64) {
    let total_weight: f64 = active.iter().map(|p| p.weight).sum();
    if total_weight <= 0.0 {
        return (0.0, 0.0);
    }
    let yes_weight: f64 = active
        .iter()
        .filter(|p| votes.get(&p.participant_id) == Some(&Decision::Yes))
        .map(|p| p.weight)
        .sum();
    (yes_weight / total_weight, total_weight)
}
