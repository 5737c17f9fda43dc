//! Trade executor - the public entry point for trade execution
//!
//! Wires the price oracle, pricing engine, ledger and audit recorder into
//! one atomic operation. Trades on the same account are serialized by a
//! per-account async mutex held for validation and mutation; the oracle
//! call happens before the lock is taken so slow price I/O never blocks
//! unrelated executions.

use crate::config::EngineConfig;
use crate::domain::entities::trade::{OrderType, Trade, TradeSide};
use crate::domain::errors::TradeError;
use crate::domain::repositories::price_oracle::PriceOracle;
use crate::domain::services::audit_recorder::AuditRecorder;
use crate::domain::services::ledger::{Ledger, OrderTicket};
use crate::domain::services::pricing::{ExecutionPricing, SlippageModel};
use crate::domain::value_objects::{price::Price, quantity::Quantity};
use crate::persistence::repository::{
    AccountRepository, AuditRepository, PositionRepository,
};
use crate::persistence::DbPool;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One inbound trade request.
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub account_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub signal_id: Option<String>,
    pub mentor_suggested: bool,
    pub actor_id: String,
}

/// Registry of per-account execution locks, populated lazily.
struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn for_account(&self, account_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Orchestrates trade execution against the virtual ledger.
pub struct TradeExecutor {
    pool: DbPool,
    oracle: Arc<dyn PriceOracle>,
    pricing: ExecutionPricing,
    ledger: Ledger,
    locks: AccountLocks,
}

impl TradeExecutor {
    pub fn new(
        pool: DbPool,
        oracle: Arc<dyn PriceOracle>,
        config: &EngineConfig,
        slippage_model: Arc<dyn SlippageModel>,
    ) -> Self {
        Self {
            pool,
            oracle,
            pricing: ExecutionPricing::new(
                config.max_slippage,
                config.limit_tolerance,
                slippage_model,
            ),
            ledger: Ledger::new(config.fee_rate),
            locks: AccountLocks::new(),
        }
    }

    /// Execute one trade request atomically.
    ///
    /// Exactly one Trade, at most one position mutation, one balance
    /// mutation and one audit entry are produced - or none at all.
    pub async fn execute(&self, request: TradeRequest) -> Result<Trade, TradeError> {
        let quantity = self.validate_quantity(&request)?;
        let limit_price = self.validate_limit_price(&request)?;

        // Reference price is fetched before entering the account's critical
        // section; a timed-out oracle call aborts with no state touched.
        let reference = match self.oracle.get_price(&request.symbol, None).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Price oracle failed for {}: {}", request.symbol, e);
                return Err(TradeError::PriceUnavailable {
                    symbol: request.symbol.clone(),
                });
            }
        };

        let lock = self.locks.for_account(&request.account_id).await;
        let _guard = lock.lock().await;

        let mut conn = self.pool.acquire().await.map_err(|e| {
            TradeError::ExecutionFailed {
                reason: format!("Failed to acquire connection: {}", e),
            }
        })?;

        let account = AccountRepository::get(&mut conn, &request.account_id)
            .await?
            .ok_or_else(|| TradeError::AccountNotFound {
                account_id: request.account_id.clone(),
            })?;
        if !account.is_active {
            return Err(TradeError::AccountInactive {
                account_id: account.id.clone(),
            });
        }

        let open_position =
            PositionRepository::open_for_symbol(&mut conn, &account.id, &request.symbol).await?;
        drop(conn);

        let fill =
            self.pricing
                .price_order(reference, request.side, request.order_type, limit_price)?;

        let ticket = OrderTicket {
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity,
            signal_id: request.signal_id.clone(),
            mentor_suggested: request.mentor_suggested,
        };

        let mut tx = self.pool.begin().await.map_err(|e| TradeError::ExecutionFailed {
            reason: format!("Failed to begin transaction: {}", e),
        })?;

        let trade = self
            .ledger
            .apply_fill(&mut tx, &account, open_position, &ticket, &fill)
            .await?;

        // The trade must not exist without its audit record; a failure here
        // rolls the whole unit back.
        let audit = AuditRecorder::record_creation(&trade, &request.actor_id)?;
        AuditRepository::insert(&mut tx, &audit).await?;

        tx.commit().await.map_err(|e| TradeError::ExecutionFailed {
            reason: format!("Failed to commit trade: {}", e),
        })?;

        info!(
            "Executed {} {} {} @ {} for account {} (fee {}, slippage {})",
            trade.side,
            trade.quantity,
            trade.symbol,
            trade.price,
            trade.account_id,
            trade.fee,
            trade.slippage
        );

        Ok(trade)
    }

    /// Re-mark all open positions of an account at current oracle prices
    /// and recompute equity (cash + unrealized PnL). Mutates no cash and
    /// creates no trades; safe to call on a timer or on demand. Returns
    /// the recomputed equity.
    pub async fn refresh_pnl(&self, account_id: &str) -> Result<Decimal, TradeError> {
        // Collect symbols and fetch quotes before taking the lock.
        let mut conn = self.pool.acquire().await.map_err(|e| {
            TradeError::ExecutionFailed {
                reason: format!("Failed to acquire connection: {}", e),
            }
        })?;
        let positions = PositionRepository::open_for_account(&mut conn, account_id).await?;
        drop(conn);

        let mut prices: HashMap<String, Price> = HashMap::new();
        for position in &positions {
            if prices.contains_key(&position.symbol) {
                continue;
            }
            match self.oracle.get_price(&position.symbol, None).await {
                Ok(price) => {
                    prices.insert(position.symbol.clone(), price);
                }
                Err(e) => {
                    // A stale mark is preferable to failing the whole
                    // refresh; the next cycle will catch up.
                    warn!("Skipping re-mark of {}: {}", position.symbol, e);
                }
            }
        }

        let lock = self.locks.for_account(account_id).await;
        let _guard = lock.lock().await;

        let mut tx = self.pool.begin().await.map_err(|e| TradeError::ExecutionFailed {
            reason: format!("Failed to begin transaction: {}", e),
        })?;

        let account = AccountRepository::get(&mut tx, account_id)
            .await?
            .ok_or_else(|| TradeError::AccountNotFound {
                account_id: account_id.to_string(),
            })?;

        // Re-read inside the transaction so the marks apply to a consistent
        // snapshot, never a position mid-trade.
        let mut total_unrealized = Decimal::ZERO;
        for mut position in PositionRepository::open_for_account(&mut tx, account_id).await? {
            if let Some(price) = prices.get(&position.symbol) {
                position.mark(*price);
                PositionRepository::update(&mut tx, &position).await?;
            }
            total_unrealized += position.unrealized_pnl;
        }

        let equity = account.cash_balance + total_unrealized;
        AccountRepository::update_equity(&mut tx, account_id, equity).await?;

        tx.commit().await.map_err(|e| TradeError::ExecutionFailed {
            reason: format!("Failed to commit PnL refresh: {}", e),
        })?;

        debug!("Refreshed PnL for {}: equity {}", account_id, equity);

        Ok(equity)
    }

    fn validate_quantity(&self, request: &TradeRequest) -> Result<Quantity, TradeError> {
        if request.quantity <= Decimal::ZERO {
            return Err(TradeError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", request.quantity),
            });
        }
        Quantity::new(request.quantity).map_err(|reason| TradeError::InvalidOrder { reason })
    }

    fn validate_limit_price(&self, request: &TradeRequest) -> Result<Option<Price>, TradeError> {
        match request.limit_price {
            None => Ok(None),
            Some(limit) => {
                if limit <= Decimal::ZERO {
                    return Err(TradeError::InvalidOrder {
                        reason: format!("limit price must be positive, got {}", limit),
                    });
                }
                Price::new(limit)
                    .map(Some)
                    .map_err(|reason| TradeError::InvalidOrder { reason })
            }
        }
    }
}
