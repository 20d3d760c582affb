//! Participant registration and heartbeat-driven liveness.

use crate::error::Error;
use model::{
    ids::ParticipantId,
    participant::{Participant, ParticipantStatus},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub struct ParticipantRegistry {
    epoch: Instant,
    participants: Mutex<HashMap<ParticipantId, Arc<Participant>>>,
}

impl ParticipantRegistry {
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            participants: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, address: String, weight: f64) -> ParticipantId {
        let participant = Arc::new(Participant::new(address, weight, self.epoch));
        let id = participant.participant_id;
        self.participants.lock().unwrap().insert(id, participant);
        id
    }

    pub fn heartbeat(&self, id: ParticipantId, now: Instant) -> Result<(), Error> {
        let participants = self.participants.lock().unwrap();
        let participant = participants.get(&id).ok_or(Error::UnknownParticipant(id))?;
        participant.heartbeat(now);
        Ok(())
    }

    /// Only allowed in non-active states, or while the coordinator is idle.
    /// `coordinator_idle` is supplied by the caller, which holds the
    /// in-flight lock and knows whether a transaction is underway.
    pub fn unregister(&self, id: ParticipantId, coordinator_idle: bool) -> Result<(), Error> {
        let mut participants = self.participants.lock().unwrap();
        let participant = participants.get(&id).ok_or(Error::UnknownParticipant(id))?;
        if participant.status() == ParticipantStatus::Active && !coordinator_idle {
            return Err(Error::NotIdle);
        }
        participants.remove(&id);
        Ok(())
    }

    /// Recomputes liveness from heartbeat age and returns the participants
    /// still counting toward consensus: a participant counts only while
    /// `active` and its last heartbeat is within
    /// `heartbeat_interval × heartbeat_multiplier`.
    pub fn active_participants(&self, now: Instant, heartbeat_interval: Duration, heartbeat_multiplier: u32) -> Vec<Arc<Participant>> {
        let degraded_after = heartbeat_interval * heartbeat_multiplier;
        // Failed threshold isn't independently configured; twice the degraded
        // threshold gives a participant one full degraded window before it
        // drops out of the registry's liveness view entirely.
        let failed_after = degraded_after * 2;

        let participants = self.participants.lock().unwrap();
        let mut active = Vec::new();
        for participant in participants.values() {
            if participant.status() == ParticipantStatus::Exited {
                continue;
            }
            let age = participant.last_heartbeat(now);
            if age >= failed_after {
                participant.set_status(ParticipantStatus::Failed);
                continue;
            }
            if age >= degraded_after {
                participant.set_status(ParticipantStatus::Degraded);
                continue;
            }
            if participant.status() != ParticipantStatus::Active {
                participant.set_status(ParticipantStatus::Active);
            }
            active.push(participant.clone());
        }
        active
    }

    pub fn get(&self, id: ParticipantId) -> Option<Arc<Participant>> {
        self.participants.lock().unwrap().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_registration_counts_as_active_immediately() {
        let epoch = Instant::now();
        let registry = ParticipantRegistry::new(epoch);
        let id = registry.register("p1".into(), 1.0);
        registry.heartbeat(id, epoch).unwrap();
        let active = registry.active_participants(epoch, Duration::from_secs(1), 3);
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn stale_heartbeat_demotes_to_degraded_then_failed() {
        let epoch = Instant::now();
        let registry = ParticipantRegistry::new(epoch);
        let id = registry.register("p1".into(), 1.0);
        registry.heartbeat(id, epoch).unwrap();

        let degraded_check = epoch + Duration::from_secs(4);
        let active = registry.active_participants(degraded_check, Duration::from_secs(1), 3);
        assert!(active.is_empty());
        assert_eq!(registry.get(id).unwrap().status(), ParticipantStatus::Degraded);

        let failed_check = epoch + Duration::from_secs(7);
        registry.active_participants(failed_check, Duration::from_secs(1), 3);
        assert_eq!(registry.get(id).unwrap().status(), ParticipantStatus::Failed);
    }
}
