//! Database Repository
//!
//! Data access for accounts, positions, trades and audit records. Write
//! methods take a `SqliteConnection` so the ledger can compose them into
//! one transaction; passing a transaction handle makes the whole execution
//! commit or roll back as a unit.

use super::models::*;
use super::DatabaseError;
use crate::domain::entities::account::Account;
use crate::domain::entities::audit::TradeAudit;
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::Trade;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{debug, error};

pub struct AccountRepository;

impl AccountRepository {
    pub async fn insert(conn: &mut SqliteConnection, account: &Account) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, cash_balance, equity, initial_balance, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(account.cash_balance.to_string())
        .bind(account.equity.to_string())
        .bind(account.initial_balance.to_string())
        .bind(account.is_active)
        .bind(account.created_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to insert account {}: {}", account.id, e);
            DatabaseError::QueryError(format!("Failed to insert account: {}", e))
        })?;

        debug!("Created account {} for user {}", account.id, account.user_id);
        Ok(())
    }

    pub async fn get(
        conn: &mut SqliteConnection,
        account_id: &str,
    ) -> Result<Option<Account>, DatabaseError> {
        let record = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?1")
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to get account {}: {}", account_id, e);
                DatabaseError::QueryError(format!("Failed to get account: {}", e))
            })?;

        record.map(AccountRecord::into_domain).transpose()
    }

    pub async fn list_active(conn: &mut SqliteConnection) -> Result<Vec<Account>, DatabaseError> {
        let records =
            sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE is_active = 1")
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    error!("Failed to list active accounts: {}", e);
                    DatabaseError::QueryError(format!("Failed to list active accounts: {}", e))
                })?;

        records.into_iter().map(AccountRecord::into_domain).collect()
    }

    pub async fn update_cash_balance(
        conn: &mut SqliteConnection,
        account_id: &str,
        cash_balance: Decimal,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query("UPDATE accounts SET cash_balance = ?1 WHERE id = ?2")
            .bind(cash_balance.to_string())
            .bind(account_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to update balance for {}: {}", account_id, e);
                DatabaseError::QueryError(format!("Failed to update balance: {}", e))
            })?
            .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Account not found: {}",
                account_id
            )));
        }

        debug!("Updated balance of {} to {}", account_id, cash_balance);
        Ok(())
    }

    pub async fn update_equity(
        conn: &mut SqliteConnection,
        account_id: &str,
        equity: Decimal,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE accounts SET equity = ?1 WHERE id = ?2")
            .bind(equity.to_string())
            .bind(account_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to update equity for {}: {}", account_id, e);
                DatabaseError::QueryError(format!("Failed to update equity: {}", e))
            })?;

        Ok(())
    }

    /// Accounts are never deleted, only deactivated.
    pub async fn set_active(
        conn: &mut SqliteConnection,
        account_id: &str,
        is_active: bool,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query("UPDATE accounts SET is_active = ?1 WHERE id = ?2")
            .bind(is_active)
            .bind(account_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to set active flag for {}: {}", account_id, e);
                DatabaseError::QueryError(format!("Failed to set active flag: {}", e))
            })?
            .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Account not found: {}",
                account_id
            )));
        }

        Ok(())
    }
}

pub struct PositionRepository;

impl PositionRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        position: &Position,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO positions (
                id, account_id, symbol, side, quantity, entry_price,
                current_price, unrealized_pnl, realized_pnl, is_open,
                opened_at, closed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&position.id)
        .bind(&position.account_id)
        .bind(&position.symbol)
        .bind(position.side.as_str())
        .bind(position.quantity.value().to_string())
        .bind(position.entry_price.value().to_string())
        .bind(position.current_price.value().to_string())
        .bind(position.unrealized_pnl.to_string())
        .bind(position.realized_pnl.to_string())
        .bind(position.is_open)
        .bind(position.opened_at)
        .bind(position.closed_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to insert position {}: {}", position.id, e);
            DatabaseError::QueryError(format!("Failed to insert position: {}", e))
        })?;

        debug!("Created position {} for {}", position.id, position.symbol);
        Ok(())
    }

    /// Persist the mutable state of a position after an averaging buy,
    /// a reduce/close, or a re-mark.
    pub async fn update(
        conn: &mut SqliteConnection,
        position: &Position,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE positions
            SET quantity = ?1, entry_price = ?2, current_price = ?3,
                unrealized_pnl = ?4, realized_pnl = ?5, is_open = ?6, closed_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(position.quantity.value().to_string())
        .bind(position.entry_price.value().to_string())
        .bind(position.current_price.value().to_string())
        .bind(position.unrealized_pnl.to_string())
        .bind(position.realized_pnl.to_string())
        .bind(position.is_open)
        .bind(position.closed_at)
        .bind(&position.id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to update position {}: {}", position.id, e);
            DatabaseError::QueryError(format!("Failed to update position: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Position not found: {}",
                position.id
            )));
        }

        debug!("Updated position {}", position.id);
        Ok(())
    }

    /// The open position for (account, symbol), if any. The unique index
    /// guarantees there is at most one.
    pub async fn open_for_symbol(
        conn: &mut SqliteConnection,
        account_id: &str,
        symbol: &str,
    ) -> Result<Option<Position>, DatabaseError> {
        let record = sqlx::query_as::<_, PositionRecord>(
            "SELECT * FROM positions WHERE account_id = ?1 AND symbol = ?2 AND is_open = 1",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to get open position for {}/{}: {}", account_id, symbol, e);
            DatabaseError::QueryError(format!("Failed to get open position: {}", e))
        })?;

        record.map(PositionRecord::into_domain).transpose()
    }

    pub async fn open_for_account(
        conn: &mut SqliteConnection,
        account_id: &str,
    ) -> Result<Vec<Position>, DatabaseError> {
        let records = sqlx::query_as::<_, PositionRecord>(
            "SELECT * FROM positions WHERE account_id = ?1 AND is_open = 1 ORDER BY opened_at",
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to get open positions for {}: {}", account_id, e);
            DatabaseError::QueryError(format!("Failed to get open positions: {}", e))
        })?;

        records.into_iter().map(PositionRecord::into_domain).collect()
    }
}

pub struct TradeRepository;

impl TradeRepository {
    pub async fn insert(conn: &mut SqliteConnection, trade: &Trade) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, account_id, symbol, side, order_type, quantity, price,
                slippage, fee, total, status, signal_id, mentor_suggested, executed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.account_id)
        .bind(&trade.symbol)
        .bind(trade.side.as_str())
        .bind(trade.order_type.as_str())
        .bind(trade.quantity.value().to_string())
        .bind(trade.price.value().to_string())
        .bind(trade.slippage.to_string())
        .bind(trade.fee.to_string())
        .bind(trade.total.to_string())
        .bind(trade.status.as_str())
        .bind(&trade.signal_id)
        .bind(trade.mentor_suggested)
        .bind(trade.executed_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to insert trade {}: {}", trade.id, e);
            DatabaseError::QueryError(format!("Failed to insert trade: {}", e))
        })?;

        debug!(
            "Recorded trade {}: {} {} {} @ {}",
            trade.id, trade.side, trade.quantity, trade.symbol, trade.price
        );
        Ok(())
    }

    pub async fn get(
        conn: &mut SqliteConnection,
        trade_id: &str,
    ) -> Result<Option<Trade>, DatabaseError> {
        let record = sqlx::query_as::<_, TradeRecord>("SELECT * FROM trades WHERE id = ?1")
            .bind(trade_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!("Failed to get trade {}: {}", trade_id, e);
                DatabaseError::QueryError(format!("Failed to get trade: {}", e))
            })?;

        record.map(TradeRecord::into_domain).transpose()
    }

    /// Trade history for an account, newest first.
    pub async fn for_account(
        conn: &mut SqliteConnection,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Trade>, DatabaseError> {
        let records = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE account_id = ?1 ORDER BY executed_at DESC LIMIT ?2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to get trades for {}: {}", account_id, e);
            DatabaseError::QueryError(format!("Failed to get trades: {}", e))
        })?;

        records.into_iter().map(TradeRecord::into_domain).collect()
    }
}

pub struct AuditRepository;

impl AuditRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        audit: &TradeAudit,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO trade_audit (id, trade_id, action, actor, actor_id, details, hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&audit.id)
        .bind(&audit.trade_id)
        .bind(&audit.action)
        .bind(audit.actor.as_str())
        .bind(&audit.actor_id)
        .bind(&audit.details)
        .bind(&audit.hash)
        .bind(audit.created_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to insert audit for trade {}: {}", audit.trade_id, e);
            DatabaseError::QueryError(format!("Failed to insert audit: {}", e))
        })?;

        debug!("Recorded audit {} for trade {}", audit.id, audit.trade_id);
        Ok(())
    }

    pub async fn for_trade(
        conn: &mut SqliteConnection,
        trade_id: &str,
    ) -> Result<Vec<TradeAudit>, DatabaseError> {
        let records = sqlx::query_as::<_, TradeAuditRecord>(
            "SELECT * FROM trade_audit WHERE trade_id = ?1 ORDER BY created_at",
        )
        .bind(trade_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("Failed to get audit entries for trade {}: {}", trade_id, e);
            DatabaseError::QueryError(format!("Failed to get audit entries: {}", e))
        })?;

        records.into_iter().map(TradeAuditRecord::into_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_test_database;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_account_round_trip() {
        let pool = init_test_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let account = Account::new("user-1".to_string(), dec!(50000));
        AccountRepository::insert(&mut conn, &account).await.unwrap();

        let loaded = AccountRepository::get(&mut conn, &account.id)
            .await
            .unwrap()
            .expect("account should exist");

        assert_eq!(loaded.cash_balance, dec!(50000));
        assert_eq!(loaded.user_id, "user-1");
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn test_update_cash_balance_preserves_precision() {
        let pool = init_test_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let account = Account::new("user-1".to_string(), dec!(50000));
        AccountRepository::insert(&mut conn, &account).await.unwrap();

        let new_balance = dec!(12345.678901234567890123456789);
        AccountRepository::update_cash_balance(&mut conn, &account.id, new_balance)
            .await
            .unwrap();

        let loaded = AccountRepository::get(&mut conn, &account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.cash_balance, new_balance);
    }

    #[tokio::test]
    async fn test_update_missing_account_fails() {
        let pool = init_test_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let result =
            AccountRepository::update_cash_balance(&mut conn, "missing", dec!(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_position_lookup() {
        use crate::domain::value_objects::{price::Price, quantity::Quantity};

        let pool = init_test_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let account = Account::new("user-1".to_string(), dec!(50000));
        AccountRepository::insert(&mut conn, &account).await.unwrap();

        let position = Position::open(
            account.id.clone(),
            "BTC".to_string(),
            Quantity::new(dec!(1)).unwrap(),
            Price::new(dec!(68000)).unwrap(),
            Price::new(dec!(68000)).unwrap(),
        );
        PositionRepository::insert(&mut conn, &position).await.unwrap();

        let found = PositionRepository::open_for_symbol(&mut conn, &account.id, "BTC")
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().entry_price.value(), dec!(68000));

        let missing = PositionRepository::open_for_symbol(&mut conn, &account.id, "ETH")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
