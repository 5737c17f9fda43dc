//! Price oracle contract consumed by the trade executor

use crate::domain::value_objects::price::Price;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// No quote can be produced for the symbol (unknown symbol, stale
    /// cache, upstream failure). A trade request must fail hard on this;
    /// defaulting to zero would misprice the fill.
    #[error("No price available for symbol: {symbol}")]
    PriceUnavailable { symbol: String },

    #[error("Price feed request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed price feed response: {0}")]
    MalformedResponse(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

/// Supplies the reference price a fill is computed from.
///
/// Implementations may be live (external market-data feed with its own
/// cache policy) or historical (point-in-time replay). The oracle is an
/// injected collaborator with its own lifecycle, never a process-wide
/// singleton.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current reference price for `symbol`, or the price as of a given
    /// instant when `as_of` is set and the implementation can replay it.
    async fn get_price(&self, symbol: &str, as_of: Option<DateTime<Utc>>) -> OracleResult<Price>;
}
