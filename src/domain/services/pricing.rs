//! Execution pricing engine - turns a reference price into a fill price

use crate::domain::entities::trade::{OrderType, TradeSide};
use crate::domain::errors::TradeError;
use crate::domain::value_objects::price::Price;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Resolution of the uniform slippage draw: multiples of 0.01% of the cap.
const SLIPPAGE_STEPS: u32 = 10_000;

/// Source of the simulated slippage fraction for market orders.
///
/// The engine keeps the distribution (uniform over `[0, max_slippage]`)
/// but the randomness itself is injected so tests can substitute a
/// deterministic draw and assert exact fill prices.
pub trait SlippageModel: Send + Sync {
    fn draw(&self, max_slippage: Decimal) -> Decimal;
}

/// Production model: uniform draw over `[0, max_slippage]`.
///
/// The draw happens on a decimal grid so the applied fraction is exactly
/// representable and the audited fill reproducible from the recorded value.
pub struct UniformSlippage;

impl SlippageModel for UniformSlippage {
    fn draw(&self, max_slippage: Decimal) -> Decimal {
        let step = rand::thread_rng().gen_range(0..=SLIPPAGE_STEPS);
        max_slippage * Decimal::from(step) / Decimal::from(SLIPPAGE_STEPS)
    }
}

/// Deterministic model for tests and replayed executions.
pub struct FixedSlippage(pub Decimal);

impl SlippageModel for FixedSlippage {
    fn draw(&self, max_slippage: Decimal) -> Decimal {
        self.0.min(max_slippage)
    }
}

/// A priced order: the concrete fill price and the slippage fraction that
/// produced it (zero for LIMIT fills), kept for the audit record.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub price: Price,
    pub slippage: Decimal,
}

/// Computes fill prices and rejects invalid limit requests.
pub struct ExecutionPricing {
    max_slippage: Decimal,
    limit_tolerance: Decimal,
    slippage_model: Arc<dyn SlippageModel>,
}

impl ExecutionPricing {
    pub fn new(
        max_slippage: Decimal,
        limit_tolerance: Decimal,
        slippage_model: Arc<dyn SlippageModel>,
    ) -> Self {
        Self {
            max_slippage,
            limit_tolerance,
            slippage_model,
        }
    }

    /// Price an order against the oracle-supplied reference price.
    ///
    /// MARKET: fill = reference * (1 + s) for BUY, (1 - s) for SELL, with
    /// s drawn from the slippage model - adverse execution without an
    /// order book. LIMIT: full fill at the limit price, guarded by a
    /// sanity bound on its deviation from the reference.
    pub fn price_order(
        &self,
        reference: Price,
        side: TradeSide,
        order_type: OrderType,
        limit_price: Option<Price>,
    ) -> Result<Fill, TradeError> {
        match order_type {
            OrderType::Market => {
                let slippage = self.slippage_model.draw(self.max_slippage);
                let multiplier = match side {
                    TradeSide::Buy => Decimal::ONE + slippage,
                    TradeSide::Sell => Decimal::ONE - slippage,
                };
                let price = reference
                    .multiply(multiplier)
                    .map_err(|reason| TradeError::InvalidOrder { reason })?;

                Ok(Fill { price, slippage })
            }
            OrderType::Limit => {
                let limit = limit_price.ok_or_else(|| TradeError::InvalidOrder {
                    reason: "limit price required for limit orders".to_string(),
                })?;

                if reference.value().is_zero() {
                    return Err(TradeError::InvalidOrder {
                        reason: "reference price must be positive".to_string(),
                    });
                }

                let deviation =
                    (limit.value() - reference.value()).abs() / reference.value();
                if deviation > self.limit_tolerance {
                    return Err(TradeError::PriceOutOfBounds {
                        deviation,
                        tolerance: self.limit_tolerance,
                    });
                }

                Ok(Fill {
                    price: limit,
                    slippage: Decimal::ZERO,
                })
            }
        }
    }
}
