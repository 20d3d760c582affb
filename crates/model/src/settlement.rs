//! A batch of settlements moving through the saga executor together.

use crate::ids::{BatchId, BidderId, SettlementId};
use rust_decimal::Decimal;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Route {
    pub path: Vec<String>,
    pub price_impact_bps: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Settlement {
    pub settlement_id: SettlementId,
    pub user: BidderId,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    pub expected_amount_out: Decimal,
    pub route: Route,
    pub gas_estimate: u64,
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Preparing,
    Ready,
    Executing,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SettlementBatch {
    pub batch_id: BatchId,
    pub settlements: Vec<Settlement>,
    pub total_value: Decimal,
    pub status: BatchStatus,
    pub prepare_ts: Option<Instant>,
    pub commit_ts: Option<Instant>,
    pub retries: u32,
    pub error: Option<String>,
}

impl SettlementBatch {
    pub fn new(settlements: Vec<Settlement>) -> Self {
        let total_value = settlements.iter().map(|s| s.expected_amount_out).sum();
        Self {
            batch_id: BatchId::next(),
            settlements,
            total_value,
            status: BatchStatus::Pending,
            prepare_ts: None,
            commit_ts: None,
            retries: 0,
            error: None,
        }
    }

    /// Every `settlement_id` in the batch must be distinct.
    pub fn has_distinct_settlement_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.settlements.iter().all(|s| seen.insert(s.settlement_id))
    }
}
