//! The atomic settlement executor (saga): forward steps over a
//! `RouterBridge` trait boundary, with a `dashmap`-guarded batch table and
//! liquidity locks.

pub mod config;
pub mod error;
pub mod record_store;
pub mod steps;

pub use config::ExecutorArgs;
pub use error::Error;
pub use record_store::{InMemoryRecordStore, RecordStore};
pub use steps::Step;

use dashmap::DashMap;
use model::{
    ids::BatchId,
    settlement::{BatchStatus, Settlement, SettlementBatch},
};
use router_bridge::RouterBridge;
use rust_decimal::Decimal;
use std::{sync::Arc, time::Instant};
use steps::StepError;

pub struct Executor<B: RouterBridge, R: RecordStore = InMemoryRecordStore> {
    config: ExecutorArgs,
    router_bridge: B,
    record_store: Arc<R>,
    batches: DashMap<BatchId, SettlementBatch>,
    locked_pools: DashMap<String, BatchId>,
    reserves: DashMap<String, Decimal>,
}

fn pool_key(token_in: &str, token_out: &str) -> String {
    format!("{token_in}/{token_out}")
}

impl<B: RouterBridge, R: RecordStore> Executor<B, R> {
    pub fn new(config: ExecutorArgs, router_bridge: B, record_store: Arc<R>) -> Self {
        Self {
            config,
            router_bridge,
            record_store,
            batches: DashMap::new(),
            locked_pools: DashMap::new(),
            reserves: DashMap::new(),
        }
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<SettlementBatch> {
        self.batches.get(&batch_id).map(|b| b.clone())
    }

    /// Lets callers upstream of the executor (the orchestrator's routing
    /// step) quote through the same bridge the executor itself settles
    /// against, without duplicating a connection.
    pub async fn quote(&self, token_in: &str, token_out: &str, amount_in: Decimal) -> Result<router_bridge::Route, router_bridge::Error> {
        self.router_bridge.quote(token_in, token_out, amount_in).await
    }

    /// Phase 1 of 2PC from the executor's side: validates the batch and
    /// marks it `ready` without mutating any external state.
    #[tracing::instrument(skip(self, batch))]
    pub async fn prepare(&self, mut batch: SettlementBatch, now: Instant) -> Result<SettlementBatch, Error> {
        if batch.settlements.len() > self.config.max_batch_size {
            return Err(Error::BatchTooLarge { actual: batch.settlements.len(), max: self.config.max_batch_size });
        }

        let mut violations = Vec::new();

        if !batch.has_distinct_settlement_ids() {
            violations.push("duplicate settlement_id within batch".to_string());
        }

        let aggregate_gas: u64 = batch.settlements.iter().map(|s| s.gas_estimate).sum();
        if aggregate_gas > self.config.gas_limit {
            violations.push(format!("aggregate gas {aggregate_gas} exceeds gas_limit {}", self.config.gas_limit));
        }

        for settlement in &batch.settlements {
            if settlement.deadline.is_some_and(|d| now >= d) {
                violations.push(format!("settlement {} deadline has elapsed", settlement.settlement_id));
            }
            if settlement.route.path.is_empty() {
                violations.push(format!("settlement {} has an empty route", settlement.settlement_id));
            }
            if settlement.route.price_impact_bps > self.config.max_slippage_tolerance_bps {
                violations.push(format!(
                    "settlement {} slippage {} bps exceeds max_slippage_tolerance {} bps",
                    settlement.settlement_id, settlement.route.price_impact_bps, self.config.max_slippage_tolerance_bps
                ));
            }

            match self.router_bridge.quote(&settlement.token_in, &settlement.token_out, settlement.amount_in).await {
                Ok(_) => {}
                Err(e) => violations.push(format!("settlement {} has no available liquidity: {e}", settlement.settlement_id)),
            }

            if let Ok(spot) = self.router_bridge.spot_price(&settlement.token_in, &settlement.token_out).await {
                if spot > Decimal::ZERO {
                    let implied = settlement.expected_amount_out / settlement.amount_in;
                    let deviation_bps = ((implied - spot).abs() / spot * Decimal::new(10_000, 0))
                        .round()
                        .to_string()
                        .parse::<u64>()
                        .unwrap_or(u64::MAX);
                    if deviation_bps > self.config.max_price_deviation_bps as u64 {
                        violations.push(format!(
                            "settlement {} price deviates {deviation_bps} bps from spot, exceeding max_price_deviation {} bps",
                            settlement.settlement_id, self.config.max_price_deviation_bps
                        ));
                    }
                }
            }
        }

        if !violations.is_empty() {
            return Err(Error::ValidationFailed(violations));
        }

        batch.status = BatchStatus::Ready;
        batch.prepare_ts = Some(now);
        self.batches.insert(batch.batch_id, batch.clone());
        Ok(batch)
    }

    /// Phase 2: runs the saga's forward steps, compensating on failure and
    /// retrying transient failures up to `max_retries`.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, batch_id: BatchId) -> Result<SettlementBatch, Error> {
        loop {
            let mut batch = self
                .batches
                .get(&batch_id)
                .map(|b| b.clone())
                .ok_or(Error::UnknownBatch(batch_id))?;

            if batch.status != BatchStatus::Ready {
                return Err(Error::NotReady { batch_id, status: batch.status });
            }

            batch.status = BatchStatus::Executing;
            self.batches.insert(batch_id, batch.clone());

            let mut executed = Vec::new();
            let mut failure: Option<(Step, StepError)> = None;

            for step in Step::FORWARD_ORDER {
                match self.run_step(step, &batch).await {
                    Ok(()) => executed.push(step),
                    Err(e) => {
                        failure = Some((step, e));
                        break;
                    }
                }
            }

            match failure {
                None => {
                    batch.status = BatchStatus::Completed;
                    batch.commit_ts = Some(Instant::now());
                    self.batches.insert(batch_id, batch.clone());
                    return Ok(batch);
                }
                Some((failed_step, step_error)) => {
                    for step in executed.iter().rev() {
                        if let Err(e) = self.compensate_step(*step, &batch).await {
                            tracing::warn!(?step, error = %e, "compensation failed, continuing unwind");
                        }
                    }

                    batch.error = Some(step_error.message.clone());

                    if step_error.transient && batch.retries < self.config.max_retries {
                        batch.retries += 1;
                        batch.status = BatchStatus::Ready;
                        self.batches.insert(batch_id, batch.clone());
                        continue;
                    }

                    batch.status = BatchStatus::Failed;
                    self.batches.insert(batch_id, batch.clone());
                    return Err(Error::StepFailed { step: failed_step, reason: step_error.message });
                }
            }
        }
    }

    async fn run_step(&self, step: Step, batch: &SettlementBatch) -> Result<(), StepError> {
        match step {
            Step::Validate => {
                let now = Instant::now();
                for settlement in &batch.settlements {
                    if settlement.deadline.is_some_and(|d| now >= d) {
                        return Err(StepError::terminal(format!("settlement {} deadline elapsed before execution", settlement.settlement_id)));
                    }
                }
                Ok(())
            }
            Step::LockLiquidity => self.lock_liquidity(batch),
            Step::ExecuteSwaps => self.execute_swaps(batch).await,
            Step::TransferTokens => {
                tracing::debug!(batch_id = %batch.batch_id, "transfer_tokens (no-op in this core)");
                Ok(())
            }
            Step::UpdateReserves => self.update_reserves(batch),
            Step::RecordSettlements => self.record_settlements(batch),
        }
    }

    async fn compensate_step(&self, step: Step, batch: &SettlementBatch) -> Result<(), StepError> {
        match step {
            Step::Validate => Ok(()),
            Step::LockLiquidity => self.unlock_liquidity(batch),
            Step::ExecuteSwaps => {
                tracing::debug!(batch_id = %batch.batch_id, "revert_swaps (no-op: venue swaps are not unwound, only our own bookkeeping is)");
                Ok(())
            }
            Step::TransferTokens => {
                tracing::debug!(batch_id = %batch.batch_id, "revert_transfers (no-op in this core)");
                Ok(())
            }
            Step::UpdateReserves => self.revert_reserves(batch),
            Step::RecordSettlements => self.clear_records(batch),
        }
    }

    fn lock_liquidity(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        let mut acquired = Vec::new();
        for settlement in &batch.settlements {
            let key = pool_key(&settlement.token_in, &settlement.token_out);
            match self.locked_pools.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(batch.batch_id);
                    acquired.push(key);
                }
                dashmap::mapref::entry::Entry::Occupied(slot) => {
                    if *slot.get() != batch.batch_id {
                        for key in acquired {
                            self.locked_pools.remove(&key);
                        }
                        return Err(StepError::transient(format!("pool {key} is locked by another batch")));
                    }
                }
            }
        }
        Ok(())
    }

    fn unlock_liquidity(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            let key = pool_key(&settlement.token_in, &settlement.token_out);
            if self.locked_pools.get(&key).is_some_and(|v| *v == batch.batch_id) {
                self.locked_pools.remove(&key);
            }
        }
        Ok(())
    }

    async fn execute_swaps(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            let route = router_bridge::Route {
                venue: "default".to_string(),
                token_in: settlement.token_in.clone(),
                token_out: settlement.token_out.clone(),
                amount_in: settlement.amount_in,
                amount_out: settlement.expected_amount_out,
                price_impact_bps: settlement.route.price_impact_bps,
            };
            self.router_bridge
                .execute(settlement.settlement_id, &route)
                .await
                .map_err(|e| StepError::transient(format!("settlement {} execution failed: {e}", settlement.settlement_id)))?;
        }
        Ok(())
    }

    fn update_reserves(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            self.reserves
                .entry(settlement.token_in.clone())
                .and_modify(|v| *v -= settlement.amount_in)
                .or_insert(-settlement.amount_in);
            self.reserves
                .entry(settlement.token_out.clone())
                .and_modify(|v| *v += settlement.expected_amount_out)
                .or_insert(settlement.expected_amount_out);
        }
        Ok(())
    }

    fn revert_reserves(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            self.reserves.entry(settlement.token_in.clone()).and_modify(|v| *v += settlement.amount_in);
            self.reserves
                .entry(settlement.token_out.clone())
                .and_modify(|v| *v -= settlement.expected_amount_out);
        }
        Ok(())
    }

    fn record_settlements(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            self.record_store.put(settlement.settlement_id, settlement.clone());
        }
        Ok(())
    }

    fn clear_records(&self, batch: &SettlementBatch) -> Result<(), StepError> {
        for settlement in &batch.settlements {
            self.record_store.delete(settlement.settlement_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ids::{BidderId, SettlementId},
        settlement::Route,
    };
    use router_bridge::MockRouterBridge;

    fn settlement(id_seed: u64, token_in: &str, token_out: &str) -> Settlement {
        Settlement {
            settlement_id: SettlementId::from_raw(id_seed),
            user: BidderId::new(1),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in: Decimal::new(100, 0),
            expected_amount_out: Decimal::new(95, 0),
            route: Route { path: vec![token_in.to_string(), token_out.to_string()], price_impact_bps: 10 },
            gas_estimate: 21_000,
            deadline: None,
        }
    }

    fn args() -> ExecutorArgs {
        ExecutorArgs {
            max_batch_size: 10,
            max_retries: 2,
            max_slippage_tolerance_bps: 100,
            max_price_deviation_bps: 500,
            gas_limit: 1_000_000,
        }
    }

    fn healthy_bridge() -> MockRouterBridge {
        let mut bridge = MockRouterBridge::new();
        bridge.expect_quote().returning(|token_in, token_out, amount_in| {
            Ok(router_bridge::Route {
                venue: "default".into(),
                token_in: token_in.to_string(),
                token_out: token_out.to_string(),
                amount_in,
                amount_out: amount_in * Decimal::new(95, 2),
                price_impact_bps: 10,
            })
        });
        bridge.expect_spot_price().returning(|_, _| Ok(Decimal::new(95, 2)));
        bridge
    }

    #[tokio::test]
    async fn prepares_and_executes_a_healthy_batch() {
        let mut bridge = healthy_bridge();
        bridge.expect_execute().returning(|settlement_id, route| {
            Ok(router_bridge::Execution { settlement_id, amount_out: route.amount_out, venue_reference: "tx-1".into() })
        });

        let executor = Executor::new(args(), bridge, Arc::new(InMemoryRecordStore::new()));
        let batch = SettlementBatch::new(vec![settlement(1, "USDC", "WETH")]);
        let batch_id = batch.batch_id;

        let prepared = executor.prepare(batch, Instant::now()).await.unwrap();
        assert_eq!(prepared.status, BatchStatus::Ready);

        let completed = executor.execute(batch_id).await.unwrap();
        assert_eq!(completed.status, BatchStatus::Completed);
    }

    /// The saga unwinds on an execute_swaps failure, releasing the
    /// liquidity lock acquired in the prior step.
    #[tokio::test]
    async fn unwinds_on_execute_swaps_failure() {
        let mut bridge = healthy_bridge();
        bridge.expect_execute().returning(|_, _| Err(router_bridge::Error::Unreachable("venue down".into())));

        let executor = Executor::new(
            ExecutorArgs { max_retries: 0, ..args() },
            bridge,
            Arc::new(InMemoryRecordStore::new()),
        );
        let batch = SettlementBatch::new(vec![settlement(2, "USDC", "WETH")]);
        let batch_id = batch.batch_id;

        executor.prepare(batch, Instant::now()).await.unwrap();
        let result = executor.execute(batch_id).await;
        assert!(result.is_err());

        let final_batch = executor.batch(batch_id).unwrap();
        assert_eq!(final_batch.status, BatchStatus::Failed);
        assert!(!executor.locked_pools.contains_key(&pool_key("USDC", "WETH")));
    }

    #[tokio::test]
    async fn rejects_batch_with_duplicate_settlement_ids() {
        let bridge = healthy_bridge();
        let executor = Executor::new(args(), bridge, Arc::new(InMemoryRecordStore::new()));
        let batch = SettlementBatch::new(vec![settlement(3, "USDC", "WETH"), settlement(3, "USDC", "WETH")]);

        let result = executor.prepare(batch, Instant::now()).await;
        assert!(matches!(result, Err(Error::ValidationFailed(_))));
    }
}
