//! Composition root: wires every component crate into one
//! [`orchestrator::Orchestrator`] and drives it until shutdown. Mirrors
//! `autopilot::run`'s role of building up services from `Arguments` before
//! handing control to a long-running loop.

use crate::arguments::Arguments;
use coordinator::{Coordinator, LoopbackTransport, ParticipantRegistry};
use executor::{Executor, InMemoryRecordStore};
use router_bridge::StaticRouteRouterBridge;
use std::{collections::HashMap, sync::Arc, time::Instant};

/// Type alias for the default single-node wiring: a [`LoopbackTransport`]
/// standing in for the out-of-scope multi-node participant network, and a
/// [`StaticRouteRouterBridge`] standing in for the out-of-scope venue
/// connection. Callers embedding this engine with real adapters should
/// construct `orchestrator::Orchestrator<MyBridge, MyTransport>` directly
/// instead of going through [`build`].
pub type DefaultOrchestrator = orchestrator::Orchestrator<StaticRouteRouterBridge, LoopbackTransport>;

/// Builds the engine with the reference single-node adapters. `static_prices`
/// seeds the [`StaticRouteRouterBridge`]; an empty table means every
/// settlement's route quote is rejected until an operator calls
/// `StaticRouteRouterBridge::set_price`.
pub fn build(args: &Arguments, static_prices: HashMap<(String, String), rust_decimal::Decimal>) -> DefaultOrchestrator {
    let epoch = Instant::now();
    let registry = ParticipantRegistry::new(epoch);
    let coordinator = Coordinator::new(args.coordinator.clone(), registry, LoopbackTransport);

    let router_bridge = StaticRouteRouterBridge::new("static", static_prices);
    let record_store = Arc::new(InMemoryRecordStore::default());
    let executor = Executor::new(args.executor.clone(), router_bridge, record_store);

    let circuit_breaker = circuit_breaker::CircuitBreaker::new(args.circuit_breaker.clone());

    orchestrator::Orchestrator::new(
        args.orchestrator.clone(),
        args.phantom_auction.clone(),
        coordinator,
        executor,
        circuit_breaker,
        args.circuit_breaker.timeout,
    )
}

/// Runs until a shutdown signal arrives, then flips the engine into drain
/// mode and returns. Doesn't itself serve any requests — this engine has no
/// HTTP surface — it exists so an embedder has somewhere to await while
/// delegating actual `AuctionApi` calls to `orchestrator` from other tasks
/// holding the same `Arc`.
pub async fn serve(orchestrator: Arc<DefaultOrchestrator>) {
    tokio::signal::ctrl_c().await.expect("failed to install CTRL+C handler");
    tracing::info!("received shutdown signal, draining");
    orchestrator.begin_drain();
}
