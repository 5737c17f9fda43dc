use crate::domain::value_objects::{price::Price, quantity::Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LONG" => Some(PositionSide::Long),
            "SHORT" => Some(PositionSide::Short),
            _ => None,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directional exposure to one symbol within one account.
///
/// At most one open position per (account, symbol) pair exists at any time:
/// same-direction buys fold into the existing open position with a
/// quantity-weighted average entry price. Closed positions are retained
/// for history, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub current_price: Price,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub is_open: bool,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Open a new LONG position from a first BUY.
    pub fn open(
        account_id: String,
        symbol: String,
        quantity: Quantity,
        entry_price: Price,
        marked_price: Price,
    ) -> Self {
        Position {
            id: Uuid::new_v4().to_string(),
            account_id,
            symbol,
            side: PositionSide::Long,
            quantity,
            entry_price,
            current_price: marked_price,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            is_open: true,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Fold a same-direction fill into the position.
    ///
    /// Recomputes the entry price as the quantity-weighted average of the
    /// existing cost basis and the new fill:
    /// `(old_qty * old_price + new_qty * fill) / (old_qty + new_qty)`.
    pub fn average_in(&mut self, quantity: Quantity, fill_price: Price) -> Result<(), String> {
        let existing_value = self.entry_price.value() * self.quantity.value();
        let new_value = fill_price.value() * quantity.value();
        let total_quantity = self.quantity.add(quantity)?;

        if total_quantity.is_zero() {
            return Err("Cannot average into an empty position".to_string());
        }

        self.entry_price = Price::new((existing_value + new_value) / total_quantity.value())?;
        self.quantity = total_quantity;
        Ok(())
    }

    /// Reduce the position by a sold quantity, accumulating realized PnL
    /// for the closed portion. Entry price is the cost basis and is not
    /// recomputed on sells. Returns the realized PnL delta.
    ///
    /// Callers must have validated `quantity <= self.quantity`.
    pub fn reduce(&mut self, quantity: Quantity, fill_price: Price) -> Result<Decimal, String> {
        let remaining = self.quantity.subtract(quantity)?;
        let pnl = match self.side {
            PositionSide::Long => {
                (fill_price.value() - self.entry_price.value()) * quantity.value()
            }
            PositionSide::Short => {
                (self.entry_price.value() - fill_price.value()) * quantity.value()
            }
        };

        self.quantity = remaining;
        self.realized_pnl += pnl;
        self.current_price = fill_price;

        if remaining.is_zero() {
            self.is_open = false;
            self.unrealized_pnl = Decimal::ZERO;
            self.closed_at = Some(Utc::now());
        }

        Ok(pnl)
    }

    /// Re-mark the position at a current reference price, recomputing
    /// unrealized PnL. No cash moves here.
    pub fn mark(&mut self, price: Price) {
        self.current_price = price;
        self.unrealized_pnl = match self.side {
            PositionSide::Long => {
                (price.value() - self.entry_price.value()) * self.quantity.value()
            }
            PositionSide::Short => {
                (self.entry_price.value() - price.value()) * self.quantity.value()
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_position(quantity: Decimal, entry: Decimal) -> Position {
        Position::open(
            "acc-1".to_string(),
            "BTC".to_string(),
            Quantity::new(quantity).unwrap(),
            Price::new(entry).unwrap(),
            Price::new(entry).unwrap(),
        )
    }

    #[test]
    fn test_position_open() {
        let position = long_position(dec!(1), dec!(68000));

        assert_eq!(position.symbol, "BTC");
        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.quantity.value(), dec!(1));
        assert_eq!(position.entry_price.value(), dec!(68000));
        assert_eq!(position.realized_pnl, Decimal::ZERO);
        assert!(position.is_open);
        assert!(position.closed_at.is_none());
    }

    #[test]
    fn test_average_in_weighted_entry_price() {
        let mut position = long_position(dec!(1), dec!(68000));

        position
            .average_in(Quantity::new(dec!(1)).unwrap(), Price::new(dec!(70000)).unwrap())
            .unwrap();

        // (1*68000 + 1*70000) / 2 = 69000
        assert_eq!(position.quantity.value(), dec!(2));
        assert_eq!(position.entry_price.value(), dec!(69000));
    }

    #[test]
    fn test_average_in_uneven_quantities() {
        let mut position = long_position(dec!(2), dec!(100));

        position
            .average_in(Quantity::new(dec!(1)).unwrap(), Price::new(dec!(130)).unwrap())
            .unwrap();

        // (2*100 + 1*130) / 3 = 110
        assert_eq!(position.quantity.value(), dec!(3));
        assert_eq!(position.entry_price.value(), dec!(110));
    }

    #[test]
    fn test_reduce_partial_keeps_entry_price() {
        let mut position = long_position(dec!(2), dec!(68000));

        let pnl = position
            .reduce(Quantity::new(dec!(1)).unwrap(), Price::new(dec!(70000)).unwrap())
            .unwrap();

        assert_eq!(pnl, dec!(2000));
        assert_eq!(position.quantity.value(), dec!(1));
        assert_eq!(position.entry_price.value(), dec!(68000));
        assert_eq!(position.realized_pnl, dec!(2000));
        assert!(position.is_open);
    }

    #[test]
    fn test_reduce_to_zero_closes() {
        let mut position = long_position(dec!(1), dec!(68000));

        let pnl = position
            .reduce(Quantity::new(dec!(1)).unwrap(), Price::new(dec!(70000)).unwrap())
            .unwrap();

        assert_eq!(pnl, dec!(2000));
        assert!(!position.is_open);
        assert!(position.quantity.is_zero());
        assert_eq!(position.unrealized_pnl, Decimal::ZERO);
        assert!(position.closed_at.is_some());
    }

    #[test]
    fn test_reduce_at_a_loss() {
        let mut position = long_position(dec!(1), dec!(68000));

        let pnl = position
            .reduce(Quantity::new(dec!(1)).unwrap(), Price::new(dec!(65000)).unwrap())
            .unwrap();

        assert_eq!(pnl, dec!(-3000));
        assert_eq!(position.realized_pnl, dec!(-3000));
    }

    #[test]
    fn test_mark_long() {
        let mut position = long_position(dec!(2), dec!(68000));

        position.mark(Price::new(dec!(70000)).unwrap());

        assert_eq!(position.current_price.value(), dec!(70000));
        assert_eq!(position.unrealized_pnl, dec!(4000));
    }

    #[test]
    fn test_position_side_round_trip() {
        assert_eq!(PositionSide::parse("LONG"), Some(PositionSide::Long));
        assert_eq!(PositionSide::parse("SHORT"), Some(PositionSide::Short));
        assert_eq!(PositionSide::parse("long"), None);
        assert_eq!(PositionSide::Long.to_string(), "LONG");
    }
}
