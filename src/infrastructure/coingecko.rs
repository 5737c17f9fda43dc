//! CoinGecko-backed price oracle
//!
//! Live reference prices from the CoinGecko free API with a per-symbol TTL
//! cache. The cache is owned by the oracle instance and injected wherever
//! prices are needed; there is no process-wide price map.

use crate::domain::repositories::price_oracle::{OracleError, OracleResult, PriceOracle};
use crate::domain::value_objects::price::Price;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Map tracked ticker symbols to CoinGecko coin ids.
fn coingecko_id(symbol: &str) -> Option<&'static str> {
    match symbol {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "BNB" => Some("binancecoin"),
        "SOL" => Some("solana"),
        "XRP" => Some("ripple"),
        "ADA" => Some("cardano"),
        "DOGE" => Some("dogecoin"),
        "DOT" => Some("polkadot"),
        "MATIC" => Some("matic-network"),
        "LTC" => Some("litecoin"),
        "AVAX" => Some("avalanche-2"),
        "LINK" => Some("chainlink"),
        "UNI" => Some("uniswap"),
        "ATOM" => Some("cosmos"),
        "XLM" => Some("stellar"),
        "ALGO" => Some("algorand"),
        "VET" => Some("vechain"),
        "FIL" => Some("filecoin"),
        "HBAR" => Some("hedera-hashgraph"),
        "NEAR" => Some("near"),
        _ => None,
    }
}

#[derive(Clone, Debug)]
struct CachedQuote {
    price: Price,
    fetched_at: Instant,
}

/// Live price oracle with per-symbol TTL caching.
pub struct CoinGeckoOracle {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<HashMap<String, CachedQuote>>,
    cache_ttl: Duration,
}

impl CoinGeckoOracle {
    pub fn new(cache_ttl: Duration) -> Self {
        Self::with_base_url(COINGECKO_BASE_URL.to_string(), cache_ttl)
    }

    /// Base URL override for tests pointed at a stub server.
    pub fn with_base_url(base_url: String, cache_ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            cache: Mutex::new(HashMap::new()),
            cache_ttl,
        }
    }

    async fn fetch_price(&self, symbol: &str, coin_id: &str) -> OracleResult<Price> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, coin_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::RequestFailed(format!(
                "status {} for {}",
                response.status(),
                symbol
            )));
        }

        let body: HashMap<String, HashMap<String, f64>> = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        let quote = body
            .get(coin_id)
            .and_then(|prices| prices.get("usd"))
            .copied()
            .ok_or_else(|| {
                OracleError::MalformedResponse(format!("no usd quote for {}", coin_id))
            })?;

        if quote <= 0.0 {
            return Err(OracleError::PriceUnavailable {
                symbol: symbol.to_string(),
            });
        }

        let value = Decimal::from_f64_retain(quote).ok_or_else(|| {
            OracleError::MalformedResponse(format!("unrepresentable quote {} for {}", quote, symbol))
        })?;

        Price::new(value).map_err(|e| OracleError::MalformedResponse(e))
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn get_price(&self, symbol: &str, as_of: Option<DateTime<Utc>>) -> OracleResult<Price> {
        // A live feed cannot replay the past; point-in-time queries belong
        // to the historical oracle.
        if as_of.is_some() {
            return Err(OracleError::PriceUnavailable {
                symbol: symbol.to_string(),
            });
        }

        let coin_id = coingecko_id(symbol).ok_or_else(|| OracleError::PriceUnavailable {
            symbol: symbol.to_string(),
        })?;

        if let Some(cached) = self.cache.lock().await.get(symbol) {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                debug!("Returning cached price for {}", symbol);
                return Ok(cached.price);
            }
        }

        match self.fetch_price(symbol, coin_id).await {
            Ok(price) => {
                let mut cache = self.cache.lock().await;
                cache.insert(
                    symbol.to_string(),
                    CachedQuote {
                        price,
                        fetched_at: Instant::now(),
                    },
                );
                debug!("Fetched price for {}: {}", symbol, price);
                Ok(price)
            }
            Err(e) => {
                warn!("Price fetch failed for {}: {}", symbol, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbols_have_ids() {
        assert_eq!(coingecko_id("BTC"), Some("bitcoin"));
        assert_eq!(coingecko_id("ETH"), Some("ethereum"));
        assert_eq!(coingecko_id("NEAR"), Some("near"));
    }

    #[test]
    fn test_unknown_symbol_has_no_id() {
        assert_eq!(coingecko_id("NOTACOIN"), None);
        assert_eq!(coingecko_id("btc"), None);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_unavailable() {
        let oracle = CoinGeckoOracle::new(Duration::from_secs(60));
        let result = oracle.get_price("NOTACOIN", None).await;

        assert!(matches!(
            result,
            Err(OracleError::PriceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_as_of_is_unavailable_on_live_feed() {
        let oracle = CoinGeckoOracle::new(Duration::from_secs(60));
        let result = oracle.get_price("BTC", Some(Utc::now())).await;

        assert!(matches!(
            result,
            Err(OracleError::PriceUnavailable { .. })
        ));
    }
}
