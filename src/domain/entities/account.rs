use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's pool of virtual capital.
///
/// Mutated only by the ledger during trade execution or PnL refresh.
/// `cash_balance` is never persisted negative; `equity` is a derived
/// quantity (cash + unrealized PnL of open positions), recomputed by the
/// PnL refresh, never independently authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub cash_balance: Decimal,
    pub equity: Decimal,
    pub initial_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account seeded with `initial_balance`.
    pub fn new(user_id: String, initial_balance: Decimal) -> Self {
        Account {
            id: Uuid::new_v4().to_string(),
            user_id,
            cash_balance: initial_balance,
            equity: initial_balance,
            initial_balance,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
