//! Ties clearing, phantom improvement, coordination and execution together
//! into the end-to-end settlement pipeline.
//!
//! Owns an auction end-to-end and drives it through clearing, phantom
//! improvement, coordination and execution as an explicit state machine
//! ([`state::SettlementProgress`]) instead of an implicit control-flow graph.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use api::{AuctionApi, CreateAuctionParams, SubmitBidParams};
pub use config::OrchestratorArgs;
pub use state::{SettlementProgress, SettlementState};

use async_trait::async_trait;
use circuit_breaker::CircuitBreaker;
use coordinator::{Coordinator, ParticipantTransport, Transaction};
use dashmap::DashMap;
use executor::{Executor, RecordStore};
use model::{
    Allocation, Auction, ClearingResult,
    bid::NewBid,
    error::EngineError,
    ids::{AuctionId, BidId, ParticipantId},
    settlement::{Route as SettlementRoute, Settlement, SettlementBatch},
};
use phantom_auction::PhantomAuction;
use router_bridge::RouterBridge;
use rust_decimal::Decimal;
use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Placeholder gas cost per settlement leg. There is no real gas estimator
/// here; the executor only needs a number to validate against `gas_limit`.
const ASSUMED_GAS_PER_SETTLEMENT: u64 = 150_000;

pub struct SettlementOutcome {
    pub batch: SettlementBatch,
    pub effective_price: Decimal,
    pub final_state: SettlementState,
}

struct AuctionEntry {
    auction: Auction,
    token_in: String,
    token_out: String,
    phantom: Option<PhantomAuction>,
    progress: Option<SettlementProgress>,
}

pub struct Orchestrator<B: RouterBridge, T: ParticipantTransport, R: RecordStore = executor::InMemoryRecordStore> {
    config: OrchestratorArgs,
    phantom_config: phantom_auction::PhantomAuctionArgs,
    auctions: DashMap<AuctionId, Mutex<AuctionEntry>>,
    bid_index: DashMap<BidId, AuctionId>,
    coordinator: Coordinator<T>,
    executor: Executor<B, R>,
    circuit_breaker: CircuitBreaker,
    circuit_breaker_timeout: Duration,
    drain_mode: AtomicBool,
}

impl<B: RouterBridge, T: ParticipantTransport, R: RecordStore> Orchestrator<B, T, R> {
    pub fn new(
        config: OrchestratorArgs,
        phantom_config: phantom_auction::PhantomAuctionArgs,
        coordinator: Coordinator<T>,
        executor: Executor<B, R>,
        circuit_breaker: CircuitBreaker,
        circuit_breaker_timeout: Duration,
    ) -> Self {
        Self {
            config,
            phantom_config,
            auctions: DashMap::new(),
            bid_index: DashMap::new(),
            coordinator,
            executor,
            circuit_breaker,
            circuit_breaker_timeout,
            drain_mode: AtomicBool::new(false),
        }
    }

    pub fn drain_mode(&self) -> bool {
        self.drain_mode.load(Ordering::Acquire)
    }

    /// Puts the engine into drain mode: every subsequent `settle` call is
    /// rejected. Used both internally (an `AtomicityViolation`) and by the
    /// binary's shutdown handler for a structured shutdown.
    pub fn begin_drain(&self) {
        self.drain_mode.store(true, Ordering::SeqCst);
    }

    fn reject_if_draining(&self) -> Result<(), EngineError> {
        if self.drain_mode() {
            return Err(error::atomicity_violation("settlement pipeline is in drain_mode after an atomicity violation"));
        }
        Ok(())
    }

    pub fn create_auction(&self, params: CreateAuctionParams) -> Result<AuctionId, EngineError> {
        if self.auctions.len() >= self.config.max_concurrent_auctions {
            return Err(error::transient("max_concurrent_auctions reached"));
        }
        let auction = Auction::new(params.mechanism, params.reserve_price, params.supply_schedule, params.tie_breaking);
        let auction_id = auction.auction_id;
        self.auctions.insert(
            auction_id,
            Mutex::new(AuctionEntry {
                auction,
                token_in: params.token_in,
                token_out: params.token_out,
                phantom: None,
                progress: None,
            }),
        );
        Ok(auction_id)
    }

    pub fn submit_bid(&self, params: SubmitBidParams) -> Result<BidId, EngineError> {
        let entry = self
            .auctions
            .get(&params.auction_id)
            .ok_or_else(|| error::not_found(format!("auction {} not found", params.auction_id)))?;
        let mut guard = entry.lock().expect("auction mutex poisoned");
        let new_bid = NewBid {
            bidder_id: params.bidder_id,
            quantity: params.quantity,
            price: params.price,
            is_marginal: params.is_marginal,
            min_quantity: params.min_quantity,
            metadata: Default::default(),
        };
        let bid = guard.auction.submit_bid(new_bid).map_err(error::from_auction_error)?;
        let bid_id = bid.bid_id;
        drop(guard);
        self.bid_index.insert(bid_id, params.auction_id);
        Ok(bid_id)
    }

    pub fn cancel_bid(&self, bid_id: BidId) -> Result<(), EngineError> {
        let auction_id = *self
            .bid_index
            .get(&bid_id)
            .ok_or_else(|| error::not_found(format!("bid {bid_id} not found")))?;
        let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
        let mut guard = entry.lock().expect("auction mutex poisoned");
        guard.auction.cancel_bid(bid_id).map_err(|e| match e {
            model::AuctionError::AuctionEnded => error::stale("bid's auction has already cleared"),
            other => error::from_auction_error(other),
        })?;
        drop(guard);
        self.bid_index.remove(&bid_id);
        Ok(())
    }

    pub fn run_auction(&self, auction_id: AuctionId, now: Instant) -> Result<ClearingResult, EngineError> {
        let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
        let mut guard = entry.lock().expect("auction mutex poisoned");

        if guard.auction.status().is_terminal() {
            return Err(error::stale("auction has already been cleared"));
        }

        guard.auction.begin_clearing();
        let result = clearing_engine::clear(
            guard.auction.bids(),
            &guard.auction.supply_schedule,
            guard.auction.reserve_price,
            guard.auction.tie_breaking,
        )
        .map_err(|e| error::invalid_input(e.to_string()))?;

        guard.auction.complete(result.allocations.clone());
        guard.phantom = Some(PhantomAuction::new(self.phantom_config.clone(), now));
        guard.progress = Some(SettlementProgress::new(now));
        Ok(result)
    }

    /// Exposed for a commit/reveal sidecar to feed phantom commitments into
    /// the auction's improvement round. `settle` resolves whatever has been
    /// committed by its deadline even if this is never called (improvement
    /// degrades to a no-op).
    pub fn commit_phantom_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: model::ids::BidderId,
        commitment: phantom_auction::commitment::Commitment,
        now: Instant,
    ) -> Result<(), EngineError> {
        let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
        let guard = entry.lock().expect("auction mutex poisoned");
        let phantom = guard.phantom.as_ref().ok_or_else(|| error::stale("auction has not been cleared yet"))?;
        phantom.commit(bidder_id, commitment, now).map_err(|e| error::invalid_input(e.to_string()))
    }

    pub fn reveal_phantom_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: model::ids::BidderId,
        price: Decimal,
        quantity: Decimal,
        nonce: phantom_auction::commitment::Nonce,
        now: Instant,
    ) -> Result<(), EngineError> {
        let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
        let guard = entry.lock().expect("auction mutex poisoned");
        let phantom = guard.phantom.as_ref().ok_or_else(|| error::stale("auction has not been cleared yet"))?;
        phantom.reveal(bidder_id, price, quantity, nonce, now).map_err(|e| error::invalid_input(e.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn settle(&self, auction_id: AuctionId, max_slippage_bps: u32) -> Result<SettlementOutcome, EngineError> {
        self.reject_if_draining()?;

        let (allocations, token_in, token_out, phantom_deadline) = {
            let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
            let guard = entry.lock().expect("auction mutex poisoned");
            if guard.auction.status() != model::AuctionStatus::Completed {
                return Err(error::stale("auction has not cleared yet"));
            }
            let deadline = guard.phantom.as_ref().map(|p| p.deadline());
            (guard.auction.winning_allocations.clone(), guard.token_in.clone(), guard.token_out.clone(), deadline)
        };

        let filled: Vec<Allocation> = allocations.into_iter().filter(|a| a.allocated_quantity > Decimal::ZERO).collect();
        let base_price = filled.first().map(|a| a.clearing_price).unwrap_or(Decimal::ZERO);
        let base_quantity: Decimal = filled.iter().map(|a| a.allocated_quantity).sum();

        if let Some(deadline) = phantom_deadline {
            let now = Instant::now();
            if now < deadline {
                tokio::time::sleep(deadline.saturating_duration_since(now)).await;
            }
        }

        let improved = {
            let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
            let guard = entry.lock().expect("auction mutex poisoned");
            guard.phantom.as_ref().and_then(|p| p.resolve(base_price, base_quantity))
        };
        let effective_price = improved.map(|i| i.price).unwrap_or(base_price);
        self.advance(auction_id, SettlementState::Improved)?;

        let mut settlements = Vec::with_capacity(filled.len());
        for allocation in &filled {
            let route = match self
                .circuit_breaker
                .execute(|| self.executor.quote(&token_in, &token_out, allocation.allocated_quantity))
                .await
            {
                Ok(route) => route,
                Err(circuit_breaker::Error::Open) => {
                    return Err(error::circuit_open("router bridge circuit is open", self.circuit_breaker_timeout.as_millis() as u64));
                }
                Err(circuit_breaker::Error::OperationFailed) => {
                    return Err(error::transient(format!("no route available for allocation {}", allocation.bid_id)));
                }
            };

            if route.price_impact_bps > max_slippage_bps {
                return Err(error::invalid_input(format!(
                    "allocation {} route slippage {} bps exceeds max_slippage {} bps",
                    allocation.bid_id, route.price_impact_bps, max_slippage_bps
                )));
            }

            settlements.push(Settlement {
                settlement_id: model::ids::SettlementId::next(),
                user: allocation.bidder_id,
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in: allocation.allocated_quantity,
                expected_amount_out: allocation.allocated_quantity * effective_price,
                route: SettlementRoute { path: vec![token_in.clone(), token_out.clone()], price_impact_bps: route.price_impact_bps },
                gas_estimate: ASSUMED_GAS_PER_SETTLEMENT,
                deadline: None,
            });
        }
        self.advance(auction_id, SettlementState::Routed)?;

        let batch = SettlementBatch::new(settlements);
        let batch_id = batch.batch_id;

        let outcome = self.coordinator.coordinate(&Transaction { batch_id }).await;
        match outcome {
            coordinator::CoordinationOutcome::Committed => {}
            coordinator::CoordinationOutcome::Aborted(reason) | coordinator::CoordinationOutcome::RolledBack(reason) => {
                self.advance(auction_id, SettlementState::RolledBack)?;
                return Err(error::consensus_failed(reason));
            }
        }
        self.advance(auction_id, SettlementState::Voted)?;
        self.advance(auction_id, SettlementState::Executing)?;

        let prepared = self.executor.prepare(batch, Instant::now()).await.map_err(executor_error)?;
        match self.executor.execute(prepared.batch_id).await {
            Ok(completed) => {
                let sound = completed
                    .prepare_ts
                    .zip(completed.commit_ts)
                    .is_some_and(|(prepare_ts, commit_ts)| prepare_ts <= commit_ts);
                if !sound {
                    self.drain_mode.store(true, Ordering::SeqCst);
                    self.advance(auction_id, SettlementState::RolledBack)?;
                    return Err(error::atomicity_violation(format!(
                        "batch {batch_id} reported completed but prepare_ts > commit_ts"
                    )));
                }
                self.advance(auction_id, SettlementState::Settled)?;
                Ok(SettlementOutcome { batch: completed, effective_price, final_state: SettlementState::Settled })
            }
            Err(e) => {
                self.advance(auction_id, SettlementState::RolledBack)?;
                Err(executor_error(e))
            }
        }
    }

    fn advance(&self, auction_id: AuctionId, to: SettlementState) -> Result<(), EngineError> {
        let entry = self.auctions.get(&auction_id).ok_or_else(|| error::not_found(format!("auction {auction_id} not found")))?;
        let mut guard = entry.lock().expect("auction mutex poisoned");
        let progress = guard.progress.as_mut().ok_or_else(|| error::stale("auction has no settlement progress (not yet cleared)"))?;
        progress.advance(to, Instant::now()).map_err(|e| error::invalid_input(e.to_string()))
    }

    pub fn register_participant(&self, address: String, weight: f64) -> ParticipantId {
        self.coordinator.registry().register(address, weight)
    }

    pub fn heartbeat(&self, participant_id: ParticipantId, now: Instant) -> Result<(), EngineError> {
        self.coordinator.registry().heartbeat(participant_id, now).map_err(|e| error::not_found(e.to_string()))
    }
}

/// Re-categorizes a saga failure that survived internal retries. Compensations
/// already ran, so this is recoverable by the caller proposing a fresh batch,
/// not a corruption — surfaced as transient and retried by the caller.
fn executor_error(e: executor::Error) -> EngineError {
    error::transient(e.to_string())
}

#[async_trait]
impl<B: RouterBridge, T: ParticipantTransport, R: RecordStore> AuctionApi for Orchestrator<B, T, R> {
    async fn create_auction(&self, params: CreateAuctionParams) -> Result<AuctionId, EngineError> {
        self.create_auction(params)
    }

    async fn submit_bid(&self, params: SubmitBidParams) -> Result<BidId, EngineError> {
        self.submit_bid(params)
    }

    async fn cancel_bid(&self, bid_id: BidId) -> Result<(), EngineError> {
        self.cancel_bid(bid_id)
    }

    async fn run_auction(&self, auction_id: AuctionId) -> Result<ClearingResult, EngineError> {
        self.run_auction(auction_id, Instant::now())
    }

    async fn settle(&self, auction_id: AuctionId, max_slippage_bps: u32) -> Result<SettlementOutcome, EngineError> {
        self.settle(auction_id, max_slippage_bps).await
    }

    async fn register_participant(&self, address: String, weight: f64) -> Result<ParticipantId, EngineError> {
        Ok(self.register_participant(address, weight))
    }

    async fn heartbeat(&self, participant_id: ParticipantId) -> Result<(), EngineError> {
        self.heartbeat(participant_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordinator::{CoordinatorArgs, ParticipantRegistry, ParticipantTransport, TransportError};
    use executor::{ExecutorArgs, InMemoryRecordStore};
    use model::{ElasticityType, Mechanism, TieBreaking, ids::BidderId, participant::Decision, supply::SupplySchedule};
    use router_bridge::MockRouterBridge;
    use std::sync::Arc;

    struct AlwaysYesTransport;

    #[async_trait]
    impl ParticipantTransport for AlwaysYesTransport {
        async fn prepare(&self, _participant: ParticipantId, _tx: &Transaction) -> Result<Decision, TransportError> {
            Ok(Decision::Yes)
        }
        async fn commit(&self, _participant: ParticipantId, _tx: &Transaction) -> Result<Decision, TransportError> {
            Ok(Decision::Yes)
        }
        async fn abort(&self, _participant: ParticipantId, _tx: &Transaction) {}
        async fn rollback(&self, _participant: ParticipantId, _tx: &Transaction) {}
    }

    fn supply_schedule() -> SupplySchedule {
        SupplySchedule {
            base_quantity: Decimal::new(1000, 0),
            price_floor: Decimal::new(10, 0),
            price_ceiling: Decimal::new(100, 0),
            elasticity_type: ElasticityType::Linear,
            elasticity_factor: Decimal::ONE,
            max_multiplier: Decimal::new(2, 0),
        }
    }

    fn orchestrator() -> Orchestrator<MockRouterBridge, AlwaysYesTransport> {
        let epoch = Instant::now();
        let registry = ParticipantRegistry::new(epoch);
        let coordinator = Coordinator::new(
            CoordinatorArgs {
                prepare_timeout: Duration::from_millis(200),
                commit_timeout: Duration::from_millis(200),
                consensus_threshold: 0.5,
                retry_count: 0,
                heartbeat_interval: Duration::from_secs(5),
                heartbeat_multiplier: 3,
            },
            registry,
            AlwaysYesTransport,
        );
        let id = coordinator.registry().register("p1".into(), 1.0);
        coordinator.registry().heartbeat(id, epoch).unwrap();

        let mut bridge = MockRouterBridge::new();
        bridge.expect_quote().returning(|token_in, token_out, amount_in| {
            Ok(router_bridge::Route {
                venue: "default".into(),
                token_in: token_in.to_string(),
                token_out: token_out.to_string(),
                amount_in,
                amount_out: amount_in,
                price_impact_bps: 5,
            })
        });
        bridge.expect_execute().returning(|settlement_id, route| {
            Ok(router_bridge::Execution { settlement_id, amount_out: route.amount_out, venue_reference: "tx".into() })
        });
        bridge.expect_spot_price().returning(|_, _| Ok(Decimal::new(55, 0)));

        let executor = Executor::new(
            ExecutorArgs {
                max_batch_size: 10,
                max_retries: 1,
                max_slippage_tolerance_bps: 1000,
                // The clearing price in these fixtures is the reserve/floor
                // price, not a real market spot price, so price-deviation
                // validation is widened rather than made realistic here.
                max_price_deviation_bps: 10_000,
                gas_limit: 10_000_000,
            },
            bridge,
            Arc::new(InMemoryRecordStore::new()),
        );

        let circuit_breaker = CircuitBreaker::new(circuit_breaker::CircuitBreakerArgs {
            failure_threshold: 5,
            error_percentage_threshold: 50,
            volume_threshold: 10,
            slow_call_threshold: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
            recovery_threshold: 3,
            half_open_max_calls: 1,
            window_size: 20,
        });

        Orchestrator::new(
            OrchestratorArgs { max_concurrent_auctions: 10, auction_timeout: Duration::from_secs(5) },
            phantom_auction::PhantomAuctionArgs {
                duration: Duration::from_millis(10),
                reveal_delay: Duration::from_millis(5),
                min_improvement_bps: 0,
                max_improvement_bps: 500,
                min_participants: 10,
                mechanism: phantom_auction::PhantomMechanism::Uniform,
            },
            coordinator,
            executor,
            circuit_breaker,
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn end_to_end_clears_and_settles_a_simple_auction() {
        let orchestrator = orchestrator();
        let auction_id = orchestrator
            .create_auction(
                CreateAuctionParams {
                    mechanism: Mechanism::Augmented,
                    reserve_price: Decimal::new(10, 0),
                    supply_schedule: supply_schedule(),
                    tie_breaking: TieBreaking::new(Decimal::new(5, 1), Decimal::new(5, 1)).unwrap(),
                    token_in: "USDC".to_string(),
                    token_out: "WETH".to_string(),
                },
            )
            .unwrap();

        orchestrator
            .submit_bid(SubmitBidParams {
                auction_id,
                bidder_id: BidderId::new(1),
                quantity: Decimal::new(500, 0),
                price: Decimal::new(60, 0),
                is_marginal: false,
                min_quantity: None,
            })
            .unwrap();

        let result = orchestrator.run_auction(auction_id, Instant::now()).unwrap();
        assert!(result.total_allocated > Decimal::ZERO);

        let outcome = orchestrator.settle(auction_id, 1000).await.unwrap();
        assert_eq!(outcome.final_state, SettlementState::Settled);
        assert_eq!(outcome.batch.status, model::BatchStatus::Completed);
    }

    #[tokio::test]
    async fn duplicate_run_auction_is_rejected_as_stale() {
        let orchestrator = orchestrator();
        let auction_id = orchestrator
            .create_auction(
                CreateAuctionParams {
                    mechanism: Mechanism::Augmented,
                    reserve_price: Decimal::new(10, 0),
                    supply_schedule: supply_schedule(),
                    tie_breaking: TieBreaking::new(Decimal::new(5, 1), Decimal::new(5, 1)).unwrap(),
                    token_in: "USDC".to_string(),
                    token_out: "WETH".to_string(),
                },
            )
            .unwrap();
        orchestrator.run_auction(auction_id, Instant::now()).unwrap();
        let err = orchestrator.run_auction(auction_id, Instant::now()).unwrap_err();
        assert_eq!(err.code(), "stale");
    }
}
