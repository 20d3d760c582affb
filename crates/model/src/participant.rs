//! Coordinator participants and the votes they cast.

use crate::ids::ParticipantId;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Degraded,
    Failed,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prepare,
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct Vote {
    pub participant_id: ParticipantId,
    pub phase: Phase,
    pub decision: Decision,
    pub reason: Option<String>,
    pub received_at: Instant,
}

/// Tracks `last_heartbeat` as a lock-free atomic so the heartbeat handler
/// never needs to take the same lock vote collection holds, avoiding a
/// recursive mutex.
#[derive(Debug)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub address: String,
    pub weight: f64,
    status: std::sync::atomic::AtomicU8,
    last_heartbeat_millis: AtomicU64,
    epoch: Instant,
    pub vote_history: std::sync::Mutex<VecDeque<Vote>>,
}

const VOTE_HISTORY_CAPACITY: usize = 64;

impl Participant {
    pub fn new(address: String, weight: f64, epoch: Instant) -> Self {
        Self {
            participant_id: ParticipantId::next(),
            address,
            weight,
            status: std::sync::atomic::AtomicU8::new(ParticipantStatus::Active as u8),
            last_heartbeat_millis: AtomicU64::new(0),
            epoch,
            vote_history: std::sync::Mutex::new(VecDeque::with_capacity(VOTE_HISTORY_CAPACITY)),
        }
    }

    pub fn status(&self) -> ParticipantStatus {
        match self.status.load(Ordering::Acquire) {
            0 => ParticipantStatus::Active,
            1 => ParticipantStatus::Degraded,
            2 => ParticipantStatus::Failed,
            _ => ParticipantStatus::Exited,
        }
    }

    pub fn set_status(&self, status: ParticipantStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    pub fn heartbeat(&self, now: Instant) {
        let millis = now.saturating_duration_since(self.epoch).as_millis() as u64;
        self.last_heartbeat_millis.store(millis, Ordering::Release);
        if self.status() != ParticipantStatus::Exited {
            self.set_status(ParticipantStatus::Active);
        }
    }

    pub fn last_heartbeat(&self, now: Instant) -> std::time::Duration {
        let last = self.last_heartbeat_millis.load(Ordering::Acquire);
        let elapsed_since_epoch = now.saturating_duration_since(self.epoch).as_millis() as u64;
        std::time::Duration::from_millis(elapsed_since_epoch.saturating_sub(last))
    }

    pub fn record_vote(&self, vote: Vote) {
        let mut history = self.vote_history.lock().expect("vote history mutex poisoned");
        if history.len() == VOTE_HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(vote);
    }
}
