//! Ledger mutator - applies a validated fill to exactly one account

use crate::domain::entities::account::Account;
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::{OrderType, Trade, TradeSide, TradeStatus};
use crate::domain::errors::TradeError;
use crate::domain::services::pricing::Fill;
use crate::domain::value_objects::quantity::Quantity;
use crate::persistence::repository::{AccountRepository, PositionRepository, TradeRepository};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// The order being settled, as validated by the executor.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    pub symbol: String,
    pub side: TradeSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub signal_id: Option<String>,
    pub mentor_suggested: bool,
}

/// Applies fills to the ledger: one cash mutation, at most one position
/// mutation, one immutable Trade record.
///
/// All writes go through the connection handed in by the caller; handed a
/// transaction, the whole application commits or rolls back as a unit.
/// Preconditions are checked before the first write, so a rejected order
/// leaves no partial state behind.
pub struct Ledger {
    fee_rate: Decimal,
}

impl Ledger {
    pub fn new(fee_rate: Decimal) -> Self {
        Self { fee_rate }
    }

    /// Settle a priced order against the account's cash and position state.
    ///
    /// The caller must hold the account's execution lock and pass state
    /// loaded under it; the balance check here is the authoritative one.
    pub async fn apply_fill(
        &self,
        conn: &mut SqliteConnection,
        account: &Account,
        open_position: Option<Position>,
        ticket: &OrderTicket,
        fill: &Fill,
    ) -> Result<Trade, TradeError> {
        let cost = fill.price.value() * ticket.quantity.value();
        let fee = cost * self.fee_rate;

        let total = match ticket.side {
            TradeSide::Buy => {
                let total = cost + fee;
                if account.cash_balance < total {
                    return Err(TradeError::InsufficientBalance {
                        required: total,
                        available: account.cash_balance,
                    });
                }
                total
            }
            TradeSide::Sell => {
                let available = open_position
                    .as_ref()
                    .map(|p| p.quantity.value())
                    .unwrap_or(Decimal::ZERO);
                if available < ticket.quantity.value() {
                    return Err(TradeError::InsufficientPosition {
                        requested: ticket.quantity.value(),
                        available,
                    });
                }
                cost - fee
            }
        };

        let trade = Trade {
            id: Uuid::new_v4().to_string(),
            account_id: account.id.clone(),
            symbol: ticket.symbol.clone(),
            side: ticket.side,
            order_type: ticket.order_type,
            quantity: ticket.quantity,
            price: fill.price,
            slippage: fill.slippage,
            fee,
            total,
            status: TradeStatus::Executed,
            signal_id: ticket.signal_id.clone(),
            mentor_suggested: ticket.mentor_suggested,
            executed_at: Utc::now(),
        };

        TradeRepository::insert(&mut *conn, &trade).await?;

        match ticket.side {
            TradeSide::Buy => {
                let new_balance = account.cash_balance - total;
                AccountRepository::update_cash_balance(&mut *conn, &account.id, new_balance)
                    .await?;

                match open_position {
                    Some(mut position) => {
                        position
                            .average_in(ticket.quantity, fill.price)
                            .map_err(|reason| TradeError::ExecutionFailed { reason })?;
                        PositionRepository::update(&mut *conn, &position).await?;
                    }
                    None => {
                        let position = Position::open(
                            account.id.clone(),
                            ticket.symbol.clone(),
                            ticket.quantity,
                            fill.price,
                            fill.price,
                        );
                        PositionRepository::insert(&mut *conn, &position).await?;
                    }
                }
            }
            TradeSide::Sell => {
                let new_balance = account.cash_balance + total;
                AccountRepository::update_cash_balance(&mut *conn, &account.id, new_balance)
                    .await?;

                // Precondition above guarantees the position exists and covers
                // the sold quantity.
                match open_position {
                    Some(mut position) => {
                        position
                            .reduce(ticket.quantity, fill.price)
                            .map_err(|reason| TradeError::ExecutionFailed { reason })?;
                        PositionRepository::update(&mut *conn, &position).await?;
                    }
                    None => {
                        return Err(TradeError::ExecutionFailed {
                            reason: "open position missing during settlement".to_string(),
                        });
                    }
                }
            }
        }

        Ok(trade)
    }
}
