//! Database Models
//!
//! Row-level records for accounts, positions, trades and audit entries,
//! with conversions into domain entities. Monetary TEXT columns are parsed
//! into `Decimal` here so parse failures surface as typed errors instead
//! of corrupting the ledger silently.

use super::DatabaseError;
use crate::domain::entities::account::Account;
use crate::domain::entities::audit::{AuditActor, TradeAudit};
use crate::domain::entities::position::{Position, PositionSide};
use crate::domain::entities::trade::{OrderType, Trade, TradeSide, TradeStatus};
use crate::domain::value_objects::{price::Price, quantity::Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(value).map_err(|_| DatabaseError::CorruptValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn parse_enum<T>(column: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T, DatabaseError> {
    parse(value).ok_or_else(|| DatabaseError::CorruptValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Account row
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub id: String,
    pub user_id: String,
    pub cash_balance: String,
    pub equity: String,
    pub initial_balance: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    pub fn into_domain(self) -> Result<Account, DatabaseError> {
        Ok(Account {
            cash_balance: parse_decimal("cash_balance", &self.cash_balance)?,
            equity: parse_decimal("equity", &self.equity)?,
            initial_balance: parse_decimal("initial_balance", &self.initial_balance)?,
            id: self.id,
            user_id: self.user_id,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// Position row
#[derive(Debug, Clone, FromRow)]
pub struct PositionRecord {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub entry_price: String,
    pub current_price: String,
    pub unrealized_pnl: String,
    pub realized_pnl: String,
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PositionRecord {
    pub fn into_domain(self) -> Result<Position, DatabaseError> {
        let quantity = Quantity::new(parse_decimal("quantity", &self.quantity)?)
            .map_err(|_| DatabaseError::CorruptValue {
                column: "quantity".to_string(),
                value: self.quantity.clone(),
            })?;
        let entry_price = Price::new(parse_decimal("entry_price", &self.entry_price)?)
            .map_err(|_| DatabaseError::CorruptValue {
                column: "entry_price".to_string(),
                value: self.entry_price.clone(),
            })?;
        let current_price = Price::new(parse_decimal("current_price", &self.current_price)?)
            .map_err(|_| DatabaseError::CorruptValue {
                column: "current_price".to_string(),
                value: self.current_price.clone(),
            })?;

        Ok(Position {
            side: parse_enum("side", &self.side, PositionSide::parse)?,
            quantity,
            entry_price,
            current_price,
            unrealized_pnl: parse_decimal("unrealized_pnl", &self.unrealized_pnl)?,
            realized_pnl: parse_decimal("realized_pnl", &self.realized_pnl)?,
            id: self.id,
            account_id: self.account_id,
            symbol: self.symbol,
            is_open: self.is_open,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
        })
    }
}

/// Trade row
#[derive(Debug, Clone, FromRow)]
pub struct TradeRecord {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: String,
    pub slippage: String,
    pub fee: String,
    pub total: String,
    pub status: String,
    pub signal_id: Option<String>,
    pub mentor_suggested: bool,
    pub executed_at: DateTime<Utc>,
}

impl TradeRecord {
    pub fn into_domain(self) -> Result<Trade, DatabaseError> {
        let quantity = Quantity::new(parse_decimal("quantity", &self.quantity)?)
            .map_err(|_| DatabaseError::CorruptValue {
                column: "quantity".to_string(),
                value: self.quantity.clone(),
            })?;
        let price = Price::new(parse_decimal("price", &self.price)?).map_err(|_| {
            DatabaseError::CorruptValue {
                column: "price".to_string(),
                value: self.price.clone(),
            }
        })?;

        Ok(Trade {
            side: parse_enum("side", &self.side, TradeSide::parse)?,
            order_type: parse_enum("order_type", &self.order_type, OrderType::parse)?,
            status: parse_enum("status", &self.status, TradeStatus::parse)?,
            quantity,
            price,
            slippage: parse_decimal("slippage", &self.slippage)?,
            fee: parse_decimal("fee", &self.fee)?,
            total: parse_decimal("total", &self.total)?,
            id: self.id,
            account_id: self.account_id,
            symbol: self.symbol,
            signal_id: self.signal_id,
            mentor_suggested: self.mentor_suggested,
            executed_at: self.executed_at,
        })
    }
}

/// Audit row
#[derive(Debug, Clone, FromRow)]
pub struct TradeAuditRecord {
    pub id: String,
    pub trade_id: String,
    pub action: String,
    pub actor: String,
    pub actor_id: String,
    pub details: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

impl TradeAuditRecord {
    pub fn into_domain(self) -> Result<TradeAudit, DatabaseError> {
        Ok(TradeAudit {
            actor: parse_enum("actor", &self.actor, AuditActor::parse)?,
            id: self.id,
            trade_id: self.trade_id,
            action: self.action,
            actor_id: self.actor_id,
            details: self.details,
            hash: self.hash,
            created_at: self.created_at,
        })
    }
}
