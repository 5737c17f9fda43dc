use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative monetary price.
///
/// All monetary math in the engine is fixed-point decimal; binary floating
/// point never touches money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, String> {
        if value >= Decimal::ZERO {
            Ok(Price(value))
        } else {
            Err("Price must be non-negative".to_string())
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Multiply by an arbitrary factor, e.g. a slippage multiplier.
    pub fn multiply(&self, factor: Decimal) -> Result<Price, String> {
        Price::new(self.0 * factor)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_new_valid() {
        let price = Price::new(dec!(100));
        assert!(price.is_ok());
        assert_eq!(price.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_price_new_negative() {
        let price = Price::new(dec!(-10));
        assert!(price.is_err());
        assert_eq!(price.unwrap_err(), "Price must be non-negative");
    }

    #[test]
    fn test_price_new_zero() {
        let price = Price::new(Decimal::ZERO);
        assert!(price.is_ok());
        assert_eq!(price.unwrap().value(), Decimal::ZERO);
    }

    #[test]
    fn test_price_multiply() {
        let price = Price::new(dec!(10)).unwrap();
        let result = price.multiply(dec!(2.5)).unwrap();
        assert_eq!(result.value(), dec!(25));
    }

    #[test]
    fn test_price_multiply_negative_factor() {
        let price = Price::new(dec!(10)).unwrap();
        let result = price.multiply(dec!(-2));
        assert!(result.is_err());
    }

    #[test]
    fn test_price_multiply_is_exact() {
        // 68000 * 1.003 must not pick up binary-float noise
        let price = Price::new(dec!(68000)).unwrap();
        let result = price.multiply(dec!(1.003)).unwrap();
        assert_eq!(result.value(), dec!(68204.000));
    }
}
