use crate::domain::value_objects::{price::Price, quantity::Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MARKET" => Some(OrderType::Market),
            "LIMIT" => Some(OrderType::Limit),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every order fills immediately and completely at a computed price; there
/// are no partial fills or pending states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Executed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Executed => "EXECUTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EXECUTED" => Some(TradeStatus::Executed),
            _ => None,
        }
    }
}

/// An immutable record of one executed fill.
///
/// Created exactly once per successful execution, inside the same atomic
/// unit that mutates the account and position. Never mutated or deleted
/// afterward; the ledger's source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    /// Fill price after slippage (MARKET) or as specified (LIMIT)
    pub price: Price,
    /// Slippage fraction actually applied; zero for LIMIT fills
    pub slippage: Decimal,
    pub fee: Decimal,
    /// Total cash delta including the fee: debit for BUY, credit for SELL
    pub total: Decimal,
    pub status: TradeStatus,
    pub signal_id: Option<String>,
    pub mentor_suggested: bool,
    pub executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_side_round_trip() {
        assert_eq!(TradeSide::parse("BUY"), Some(TradeSide::Buy));
        assert_eq!(TradeSide::parse("SELL"), Some(TradeSide::Sell));
        assert_eq!(TradeSide::parse("HOLD"), None);
        assert_eq!(TradeSide::Buy.to_string(), "BUY");
    }

    #[test]
    fn test_order_type_round_trip() {
        assert_eq!(OrderType::parse("MARKET"), Some(OrderType::Market));
        assert_eq!(OrderType::parse("LIMIT"), Some(OrderType::Limit));
        assert_eq!(OrderType::parse("STOP"), None);
        assert_eq!(OrderType::Limit.to_string(), "LIMIT");
    }

    #[test]
    fn test_trade_status_round_trip() {
        assert_eq!(TradeStatus::parse("EXECUTED"), Some(TradeStatus::Executed));
        assert_eq!(TradeStatus::parse("PENDING"), None);
        assert_eq!(TradeStatus::Executed.as_str(), "EXECUTED");
    }
}
