//! Engine configuration

use rust_decimal::Decimal;
use std::str::FromStr;

/// Tunable parameters of the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trading fee charged on every fill (e.g., 0.001 = 0.1%)
    pub fee_rate: Decimal,
    /// Upper bound of the simulated slippage fraction for market orders
    pub max_slippage: Decimal,
    /// Maximum allowed deviation of a limit price from the reference price
    pub limit_tolerance: Decimal,
    /// Starting cash balance for newly created accounts
    pub initial_balance: Decimal,
    /// How long a fetched reference price stays fresh, in seconds
    pub price_cache_ttl_seconds: u64,
    /// Interval between PnL refresh sweeps, in seconds
    pub pnl_refresh_interval_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fee_rate: Decimal::new(1, 3),        // 0.1% fee
            max_slippage: Decimal::new(3, 3),    // 0.3% max slippage
            limit_tolerance: Decimal::new(1, 1), // 10% fat-finger guard
            initial_balance: Decimal::from(50_000),
            price_cache_ttl_seconds: 60,
            pnl_refresh_interval_seconds: 60,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults and warning on unparseable values.
    pub fn from_env() -> EngineConfig {
        let mut config = EngineConfig::default();

        set_decimal(&mut config.fee_rate, "FEE_RATE", Decimal::ZERO, Decimal::ONE);
        set_decimal(
            &mut config.max_slippage,
            "MAX_SLIPPAGE",
            Decimal::ZERO,
            Decimal::ONE,
        );
        set_decimal(
            &mut config.limit_tolerance,
            "LIMIT_TOLERANCE",
            Decimal::ZERO,
            Decimal::ONE,
        );

        if let Ok(raw) = std::env::var("INITIAL_BALANCE") {
            match Decimal::from_str(&raw) {
                Ok(value) if value > Decimal::ZERO => config.initial_balance = value,
                Ok(value) => {
                    tracing::warn!(
                        "Invalid INITIAL_BALANCE value: {} (must be positive), using default: {}",
                        value,
                        config.initial_balance
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse INITIAL_BALANCE '{}': {}, using default: {}",
                        raw,
                        e,
                        config.initial_balance
                    );
                }
            }
        }

        set_seconds(&mut config.price_cache_ttl_seconds, "PRICE_CACHE_TTL_SECONDS");
        set_seconds(
            &mut config.pnl_refresh_interval_seconds,
            "PNL_REFRESH_INTERVAL_SECONDS",
        );

        config
    }
}

fn set_decimal(target: &mut Decimal, var: &str, min: Decimal, max: Decimal) {
    if let Ok(raw) = std::env::var(var) {
        match Decimal::from_str(&raw) {
            Ok(value) if value >= min && value <= max => *target = value,
            Ok(value) => {
                tracing::warn!(
                    "Invalid {} value: {} (must be between {} and {}), using default: {}",
                    var,
                    value,
                    min,
                    max,
                    target
                );
            }
            Err(e) => {
                tracing::warn!("Failed to parse {} '{}': {}, using default: {}", var, raw, e, target);
            }
        }
    }
}

fn set_seconds(target: &mut u64, var: &str) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<u64>() {
            Ok(value) if value > 0 => *target = value,
            Ok(_) => {
                tracing::warn!("Invalid {} value: 0 (must be positive), using default: {}", var, target);
            }
            Err(e) => {
                tracing::warn!("Failed to parse {} '{}': {}, using default: {}", var, raw, e, target);
            }
        }
    }
}
