//! Static price oracle for tests and point-in-time replay
//!
//! Serves prices from an in-memory table: the latest quote per symbol for
//! current-price queries, or the last quote at-or-before a timestamp for
//! historical (`as_of`) queries.

use crate::domain::repositories::price_oracle::{OracleError, OracleResult, PriceOracle};
use crate::domain::value_objects::price::Price;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct StaticOracle {
    // Per symbol: quotes sorted by timestamp, oldest first
    quotes: RwLock<HashMap<String, Vec<(DateTime<Utc>, Price)>>>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
        }
    }

    /// Set the current quote for a symbol.
    pub async fn set_price(&self, symbol: &str, price: Price) {
        self.set_price_at(symbol, Utc::now(), price).await;
    }

    /// Record a quote at a specific instant for historical replay.
    pub async fn set_price_at(&self, symbol: &str, at: DateTime<Utc>, price: Price) {
        let mut quotes = self.quotes.write().await;
        let series = quotes.entry(symbol.to_string()).or_default();
        series.push((at, price));
        series.sort_by_key(|(ts, _)| *ts);
    }
}

impl Default for StaticOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceOracle for StaticOracle {
    async fn get_price(&self, symbol: &str, as_of: Option<DateTime<Utc>>) -> OracleResult<Price> {
        let quotes = self.quotes.read().await;
        let series = quotes.get(symbol).ok_or_else(|| OracleError::PriceUnavailable {
            symbol: symbol.to_string(),
        })?;

        let quote = match as_of {
            None => series.last(),
            Some(at) => series.iter().rev().find(|(ts, _)| *ts <= at),
        };

        quote
            .map(|(_, price)| *price)
            .ok_or_else(|| OracleError::PriceUnavailable {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_latest_price_wins() {
        let oracle = StaticOracle::new();
        oracle.set_price("BTC", Price::new(dec!(68000)).unwrap()).await;
        oracle.set_price("BTC", Price::new(dec!(69000)).unwrap()).await;

        let price = oracle.get_price("BTC", None).await.unwrap();
        assert_eq!(price.value(), dec!(69000));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_unavailable() {
        let oracle = StaticOracle::new();
        let result = oracle.get_price("BTC", None).await;

        assert!(matches!(result, Err(OracleError::PriceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_as_of_replays_history() {
        let oracle = StaticOracle::new();
        let t0 = Utc::now() - Duration::hours(2);
        let t1 = Utc::now() - Duration::hours(1);

        oracle.set_price_at("BTC", t0, Price::new(dec!(60000)).unwrap()).await;
        oracle.set_price_at("BTC", t1, Price::new(dec!(65000)).unwrap()).await;

        let then = oracle
            .get_price("BTC", Some(t0 + Duration::minutes(30)))
            .await
            .unwrap();
        assert_eq!(then.value(), dec!(60000));

        let now = oracle.get_price("BTC", None).await.unwrap();
        assert_eq!(now.value(), dec!(65000));
    }

    #[tokio::test]
    async fn test_as_of_before_first_quote_is_unavailable() {
        let oracle = StaticOracle::new();
        let t0 = Utc::now();
        oracle.set_price_at("BTC", t0, Price::new(dec!(60000)).unwrap()).await;

        let result = oracle.get_price("BTC", Some(t0 - Duration::hours(1))).await;
        assert!(matches!(result, Err(OracleError::PriceUnavailable { .. })));
    }
}
