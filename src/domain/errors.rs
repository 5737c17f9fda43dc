//! Trade execution errors with detailed context

use rust_decimal::Decimal;
use thiserror::Error;

/// Error type returned by the trade executor and ledger.
///
/// Every variant carries the numbers a caller needs to render a precise
/// message without re-deriving them from ledger state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeError {
    /// The request itself is malformed (bad quantity, missing limit price)
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// No account with the given id exists
    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: String },

    /// The account exists but has been deactivated
    #[error("Account is inactive: {account_id}")]
    AccountInactive { account_id: String },

    /// Limit price too far from the reference price
    #[error("Limit price deviates {deviation} from reference price (tolerance {tolerance})")]
    PriceOutOfBounds { deviation: Decimal, tolerance: Decimal },

    /// Not enough cash to cover a BUY including fees
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Open position missing or smaller than the requested SELL quantity
    #[error("Insufficient position: trying to sell {requested}, have {available}")]
    InsufficientPosition { requested: Decimal, available: Decimal },

    /// The price oracle could not produce a quote
    #[error("No price available for symbol: {symbol}")]
    PriceUnavailable { symbol: String },

    /// Storage failure during the atomic mutate+audit step; fully rolled back
    #[error("Trade execution failed: {reason}")]
    ExecutionFailed { reason: String },
}

impl TradeError {
    /// True for errors caused by the request or current ledger state,
    /// as opposed to infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            TradeError::PriceUnavailable { .. } | TradeError::ExecutionFailed { .. }
        )
    }

    /// Check if retrying the same request later might succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The oracle may recover; prices are time-sensitive so the
            // caller retries, never the engine itself.
            TradeError::PriceUnavailable { .. } => true,
            TradeError::ExecutionFailed { .. } => true,

            // Deterministic given the request and current state
            TradeError::InvalidOrder { .. } => false,
            TradeError::AccountNotFound { .. } => false,
            TradeError::AccountInactive { .. } => false,
            TradeError::PriceOutOfBounds { .. } => false,
            TradeError::InsufficientBalance { .. } => false,
            TradeError::InsufficientPosition { .. } => false,
        }
    }

    /// Get a short error code for logging/monitoring
    pub fn error_code(&self) -> &'static str {
        match self {
            TradeError::InvalidOrder { .. } => "ERR_INVALID_ORDER",
            TradeError::AccountNotFound { .. } => "ERR_ACCOUNT_NOT_FOUND",
            TradeError::AccountInactive { .. } => "ERR_ACCOUNT_INACTIVE",
            TradeError::PriceOutOfBounds { .. } => "ERR_PRICE_OUT_OF_BOUNDS",
            TradeError::InsufficientBalance { .. } => "ERR_INSUFFICIENT_BALANCE",
            TradeError::InsufficientPosition { .. } => "ERR_INSUFFICIENT_POSITION",
            TradeError::PriceUnavailable { .. } => "ERR_PRICE_UNAVAILABLE",
            TradeError::ExecutionFailed { .. } => "ERR_EXECUTION_FAILED",
        }
    }
}

impl From<crate::persistence::DatabaseError> for TradeError {
    fn from(e: crate::persistence::DatabaseError) -> Self {
        TradeError::ExecutionFailed {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_error_display() {
        let error = TradeError::InsufficientBalance {
            required: dec!(68272.20),
            available: dec!(50000),
        };
        assert_eq!(
            error.to_string(),
            "Insufficient balance: required 68272.20, available 50000"
        );
    }

    #[test]
    fn test_insufficient_position_error_display() {
        let error = TradeError::InsufficientPosition {
            requested: dec!(2),
            available: dec!(0.5),
        };
        assert_eq!(
            error.to_string(),
            "Insufficient position: trying to sell 2, have 0.5"
        );
    }

    #[test]
    fn test_client_errors() {
        let client_errors = vec![
            TradeError::InvalidOrder {
                reason: "quantity must be positive".to_string(),
            },
            TradeError::AccountNotFound {
                account_id: "acc-1".to_string(),
            },
            TradeError::AccountInactive {
                account_id: "acc-1".to_string(),
            },
            TradeError::PriceOutOfBounds {
                deviation: dec!(0.176),
                tolerance: dec!(0.10),
            },
            TradeError::InsufficientBalance {
                required: dec!(100),
                available: dec!(50),
            },
            TradeError::InsufficientPosition {
                requested: dec!(1),
                available: dec!(0),
            },
        ];

        for error in client_errors {
            assert!(error.is_client_error(), "expected client error: {:?}", error);
            assert!(!error.is_recoverable(), "expected non-recoverable: {:?}", error);
        }
    }

    #[test]
    fn test_dependency_and_integrity_errors() {
        let errors = vec![
            TradeError::PriceUnavailable {
                symbol: "BTC".to_string(),
            },
            TradeError::ExecutionFailed {
                reason: "database is locked".to_string(),
            },
        ];

        for error in errors {
            assert!(!error.is_client_error(), "expected server-side error: {:?}", error);
            assert!(error.is_recoverable(), "expected recoverable: {:?}", error);
        }
    }

    #[test]
    fn test_all_error_codes_unique() {
        let errors = vec![
            TradeError::InvalidOrder {
                reason: "test".to_string(),
            },
            TradeError::AccountNotFound {
                account_id: "test".to_string(),
            },
            TradeError::AccountInactive {
                account_id: "test".to_string(),
            },
            TradeError::PriceOutOfBounds {
                deviation: dec!(0.2),
                tolerance: dec!(0.1),
            },
            TradeError::InsufficientBalance {
                required: dec!(1),
                available: dec!(0),
            },
            TradeError::InsufficientPosition {
                requested: dec!(1),
                available: dec!(0),
            },
            TradeError::PriceUnavailable {
                symbol: "test".to_string(),
            },
            TradeError::ExecutionFailed {
                reason: "test".to_string(),
            },
        ];

        let mut codes = vec![];
        for error in errors {
            let code = error.error_code();
            assert!(!codes.contains(&code), "Duplicate error code: {}", code);
            codes.push(code);
        }
    }
}
