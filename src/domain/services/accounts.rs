//! Account provisioning and ledger read views
//!
//! Creation and deactivation of virtual accounts, plus the read-only
//! queries consumed by portfolio-style views. None of this mutates the
//! ledger; trade execution is the only writer of balances and positions.

use crate::domain::entities::account::Account;
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::Trade;
use crate::domain::errors::TradeError;
use crate::persistence::repository::{AccountRepository, PositionRepository, TradeRepository};
use crate::persistence::DbPool;
use rust_decimal::Decimal;
use tracing::info;

pub struct AccountService {
    pool: DbPool,
    default_initial_balance: Decimal,
}

impl AccountService {
    pub fn new(pool: DbPool, default_initial_balance: Decimal) -> Self {
        Self {
            pool,
            default_initial_balance,
        }
    }

    /// Create an account seeded with the given starting balance, or the
    /// configured default. Signup, guest creation and tournament joins all
    /// come through here.
    pub async fn create_account(
        &self,
        user_id: &str,
        initial_balance: Option<Decimal>,
    ) -> Result<Account, TradeError> {
        let balance = initial_balance.unwrap_or(self.default_initial_balance);
        if balance <= Decimal::ZERO {
            return Err(TradeError::InvalidOrder {
                reason: format!("initial balance must be positive, got {}", balance),
            });
        }

        let account = Account::new(user_id.to_string(), balance);

        let mut conn = self.acquire().await?;
        AccountRepository::insert(&mut conn, &account).await?;

        info!("Created account {} for user {} with {}", account.id, user_id, balance);
        Ok(account)
    }

    /// Accounts are deactivated, never deleted; their trades and positions
    /// remain part of history.
    pub async fn deactivate_account(&self, account_id: &str) -> Result<(), TradeError> {
        let mut conn = self.acquire().await?;
        AccountRepository::set_active(&mut conn, account_id, false).await?;
        info!("Deactivated account {}", account_id);
        Ok(())
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, TradeError> {
        let mut conn = self.acquire().await?;
        AccountRepository::get(&mut conn, account_id)
            .await?
            .ok_or_else(|| TradeError::AccountNotFound {
                account_id: account_id.to_string(),
            })
    }

    pub async fn list_active_accounts(&self) -> Result<Vec<Account>, TradeError> {
        let mut conn = self.acquire().await?;
        Ok(AccountRepository::list_active(&mut conn).await?)
    }

    pub async fn open_positions(&self, account_id: &str) -> Result<Vec<Position>, TradeError> {
        let mut conn = self.acquire().await?;
        Ok(PositionRepository::open_for_account(&mut conn, account_id).await?)
    }

    /// Trade history, newest first.
    pub async fn trade_history(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Trade>, TradeError> {
        let mut conn = self.acquire().await?;
        Ok(TradeRepository::for_account(&mut conn, account_id, limit).await?)
    }

    async fn acquire(
        &self,
    ) -> Result<sqlx::pool::PoolConnection<sqlx::Sqlite>, TradeError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| TradeError::ExecutionFailed {
                reason: format!("Failed to acquire connection: {}", e),
            })
    }
}
