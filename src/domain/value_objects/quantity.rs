use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative asset quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> Result<Self, String> {
        if value >= Decimal::ZERO {
            Ok(Quantity(value))
        } else {
            Err("Quantity must be non-negative".to_string())
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Quantity) -> Result<Quantity, String> {
        Quantity::new(self.0 + other.0)
    }

    /// Fails when subtracting more than is held.
    pub fn subtract(&self, other: Quantity) -> Result<Quantity, String> {
        Quantity::new(self.0 - other.0)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_new_valid() {
        let qty = Quantity::new(dec!(100));
        assert!(qty.is_ok());
        assert_eq!(qty.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_quantity_new_negative() {
        let qty = Quantity::new(dec!(-5));
        assert!(qty.is_err());
        assert_eq!(qty.unwrap_err(), "Quantity must be non-negative");
    }

    #[test]
    fn test_quantity_add() {
        let q1 = Quantity::new(dec!(10)).unwrap();
        let q2 = Quantity::new(dec!(5)).unwrap();
        let result = q1.add(q2).unwrap();
        assert_eq!(result.value(), dec!(15));
    }

    #[test]
    fn test_quantity_subtract_valid() {
        let q1 = Quantity::new(dec!(10)).unwrap();
        let q2 = Quantity::new(dec!(3)).unwrap();
        let result = q1.subtract(q2);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().value(), dec!(7));
    }

    #[test]
    fn test_quantity_subtract_insufficient() {
        let q1 = Quantity::new(dec!(5)).unwrap();
        let q2 = Quantity::new(dec!(10)).unwrap();
        let result = q1.subtract(q2);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), "Quantity must be non-negative");
    }

    #[test]
    fn test_quantity_subtract_to_zero() {
        let q1 = Quantity::new(dec!(2.5)).unwrap();
        let q2 = Quantity::new(dec!(2.5)).unwrap();
        let result = q1.subtract(q2).unwrap();
        assert!(result.is_zero());
    }
}
