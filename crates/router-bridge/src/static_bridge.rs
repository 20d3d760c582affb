//! A reference `RouterBridge` for deployments with no live venue connection
//! wired up yet. Real venue integration (on-chain DEX, RFQ desk, CEX) is the
//! named out-of-scope collaborator; this adapter lets the
//! `auction-engine` binary still settle against an operator-maintained table
//! of static prices rather than requiring every caller to bring a mock.
//!
//! Not meant for production price discovery. It exists so the engine is
//! runnable out of the box; swap in a real `RouterBridge` impl for anything
//! beyond a single pre-vetted token pair.

use crate::{Error, Execution, Route};
use async_trait::async_trait;
use model::ids::SettlementId;
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::RwLock};

/// Keyed by `(token_in, token_out)`.
pub struct StaticRouteRouterBridge {
    venue: String,
    prices: RwLock<HashMap<(String, String), Decimal>>,
}

impl StaticRouteRouterBridge {
    pub fn new(venue: impl Into<String>, prices: HashMap<(String, String), Decimal>) -> Self {
        Self { venue: venue.into(), prices: RwLock::new(prices) }
    }

    /// Replaces (or inserts) the price for a token pair. Lets an operator
    /// refresh the table without restarting the engine.
    pub fn set_price(&self, token_in: impl Into<String>, token_out: impl Into<String>, price: Decimal) {
        self.prices.write().unwrap().insert((token_in.into(), token_out.into()), price);
    }

    fn price(&self, token_in: &str, token_out: &str) -> Result<Decimal, Error> {
        self.prices
            .read()
            .unwrap()
            .get(&(token_in.to_string(), token_out.to_string()))
            .copied()
            .ok_or_else(|| Error::QuoteRejected(format!("no static price for {token_in}/{token_out}")))
    }
}

#[async_trait]
impl crate::RouterBridge for StaticRouteRouterBridge {
    async fn quote(&self, token_in: &str, token_out: &str, amount_in: Decimal) -> Result<Route, Error> {
        let price = self.price(token_in, token_out)?;
        Ok(Route {
            venue: self.venue.clone(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in,
            amount_out: amount_in * price,
            price_impact_bps: 0,
        })
    }

    async fn execute(&self, settlement_id: SettlementId, route: &Route) -> Result<Execution, Error> {
        Ok(Execution {
            settlement_id,
            amount_out: route.amount_out,
            venue_reference: format!("{}:{settlement_id}", self.venue),
        })
    }

    async fn spot_price(&self, token_in: &str, token_out: &str) -> Result<Decimal, Error> {
        self.price(token_in, token_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouterBridge;
    use maplit::hashmap;

    fn bridge() -> StaticRouteRouterBridge {
        StaticRouteRouterBridge::new("static", hashmap! { ("USDC".to_string(), "WETH".to_string()) => Decimal::new(55, 0) })
    }

    #[tokio::test]
    async fn quotes_at_the_configured_price() {
        let bridge = bridge();
        let route = bridge.quote("USDC", "WETH", Decimal::new(100, 0)).await.unwrap();
        assert_eq!(route.amount_out, Decimal::new(5500, 0));
        assert_eq!(route.price_impact_bps, 0);
    }

    #[tokio::test]
    async fn rejects_an_unconfigured_pair() {
        let bridge = bridge();
        let err = bridge.quote("WETH", "DAI", Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, Error::QuoteRejected(_)));
    }

    #[tokio::test]
    async fn set_price_updates_future_quotes() {
        let bridge = bridge();
        bridge.set_price("USDC", "WETH", Decimal::new(60, 0));
        let route = bridge.quote("USDC", "WETH", Decimal::new(10, 0)).await.unwrap();
        assert_eq!(route.amount_out, Decimal::new(600, 0));
    }
}
