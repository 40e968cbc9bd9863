//! Prices

use std::ops::Deref;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// Represents a price in minor currency units (kuruş, pence, cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price {
    value: i64,
}

impl Price {
    /// A price of nothing.
    pub const ZERO: Price = Price { value: 0 };

    /// Creates a new Price
    pub fn new(value: i64) -> Self {
        Price { value }
    }

    /// Creates a price from an amount of money, keeping only its minor units.
    pub fn from_money(money: &Money<'_, Currency>) -> Self {
        Price {
            value: money.to_minor_units(),
        }
    }

    /// Converts the price into money in the given currency.
    pub fn to_money(self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.value, currency)
    }

    /// Adds two prices, returning `None` on overflow.
    pub fn checked_add(self, other: Price) -> Option<Price> {
        self.value.checked_add(other.value).map(Price::new)
    }

    /// Subtracts one price from another, returning `None` on overflow.
    pub fn checked_sub(self, other: Price) -> Option<Price> {
        self.value.checked_sub(other.value).map(Price::new)
    }

    /// Multiplies the price by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Price> {
        self.value.checked_mul(i64::from(quantity)).map(Price::new)
    }
}

impl Deref for Price {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;

    use super::*;

    #[test]
    fn new_price() {
        let price = Price::new(1000);

        assert_eq!(price.value, 1000);
    }

    #[test]
    fn price_derefs_to_i64() {
        let price = Price { value: 100 };

        assert_eq!(*price, 100);
    }

    #[test]
    fn money_round_trip_keeps_minor_units() {
        let price = Price::new(8550);
        let money = price.to_money(iso::TRY);

        assert_eq!(money, Money::from_minor(8550, iso::TRY));
        assert_eq!(Price::from_money(&money), price);
    }

    #[test]
    fn checked_mul_scales_by_quantity() {
        assert_eq!(Price::new(250).checked_mul(3), Some(Price::new(750)));
        assert_eq!(Price::new(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn serializes_as_bare_integer() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&Price::new(4200))?, "4200");
        assert_eq!(serde_json::from_str::<Price>("4200")?, Price::new(4200));

        Ok(())
    }
}
