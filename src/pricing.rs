//! Pricing
//!
//! Derives unit prices when a line is created and cart totals whenever they are read. Totals
//! are always recomputed from the current lines and never cached.

use decimal_percentage::Percentage;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartLine,
    coupons::Coupon,
    discounts::{DiscountError, percent_of, percent_points},
    prices::Price,
    products::{Configuration, Product},
};

/// Sales tax charged on the discounted subtotal, in percent points.
pub const TAX_PERCENT_POINTS: u32 = 20;

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Amount does not fit in minor units.
    #[error("amount overflowed while pricing the cart")]
    Overflow,

    /// Wrapped percentage error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Tax rate applied to the discounted subtotal.
pub fn tax_rate() -> Percentage {
    percent_points(TAX_PERCENT_POINTS)
}

/// Price of one unit of a product in the given configuration: the marked-down base price plus
/// every selected option's delta.
///
/// # Errors
///
/// Returns a [`PricingError`] if the amount cannot be represented.
pub fn unit_price(product: &Product, config: &Configuration<'_>) -> Result<Price, PricingError> {
    let base = product.discounted_price()?;
    let options = config.options_price().ok_or(PricingError::Overflow)?;

    base.checked_add(options).ok_or(PricingError::Overflow)
}

/// Unit price multiplied by quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the amount cannot be represented.
pub fn line_total(line: &CartLine) -> Result<Price, PricingError> {
    line.unit_price
        .checked_mul(line.quantity)
        .ok_or(PricingError::Overflow)
}

/// Monetary amounts of a priced cart, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line totals
    pub subtotal: Price,

    /// Coupon discount
    pub discount: Price,

    /// Tax on the discounted subtotal
    pub tax: Price,

    /// Amount to pay
    pub total: Price,
}

/// Derived totals for the current cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    amounts: Totals,
    item_count: u32,
    currency: &'static Currency,
}

impl CartTotals {
    /// Sum of line totals
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.amounts.subtotal.to_money(self.currency)
    }

    /// Coupon discount
    pub fn discount(&self) -> Money<'static, Currency> {
        self.amounts.discount.to_money(self.currency)
    }

    /// Tax on the discounted subtotal
    pub fn tax(&self) -> Money<'static, Currency> {
        self.amounts.tax.to_money(self.currency)
    }

    /// Amount to pay
    pub fn total(&self) -> Money<'static, Currency> {
        self.amounts.total.to_money(self.currency)
    }

    /// Number of units across all lines
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    /// The amounts in minor units, for snapshots.
    pub fn amounts(&self) -> Totals {
        self.amounts
    }

    /// Currency of every amount
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// Calculates the totals of a set of cart lines with an optional coupon.
///
/// `discount` follows the coupon's rule, `tax` is charged on `subtotal - discount`, and
/// `total = subtotal - discount + tax`. Coupons are not re-checked against their minimum here.
///
/// # Errors
///
/// Returns a [`PricingError`] if money arithmetic fails or an amount overflows.
pub fn cart_totals(
    lines: &[CartLine],
    coupon: Option<&Coupon>,
    currency: &'static Currency,
) -> Result<CartTotals, PricingError> {
    let subtotal = lines.iter().try_fold(
        Money::from_minor(0, currency),
        |acc, line| -> Result<_, PricingError> {
            Ok(acc.add(line_total(line)?.to_money(currency))?)
        },
    )?;

    let subtotal = Price::from_money(&subtotal);

    let discount = match coupon {
        Some(coupon) => coupon.discount.amount_off(subtotal)?,
        None => Price::ZERO,
    };

    let taxable = subtotal.checked_sub(discount).ok_or(PricingError::Overflow)?;
    let tax = percent_of(&tax_rate(), taxable)?;
    let total = taxable.checked_add(tax).ok_or(PricingError::Overflow)?;

    let item_count = lines
        .iter()
        .try_fold(0u32, |acc, line| acc.checked_add(line.quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(CartTotals {
        amounts: Totals {
            subtotal,
            discount,
            tax,
            total,
        },
        item_count,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::TRY;
    use testresult::TestResult;

    use crate::{
        cart::Cart,
        coupons::tests::{fixed_coupon, percent_coupon},
        products::tests::latte,
    };

    use super::*;

    #[test]
    fn unit_price_adds_options_to_marked_down_base() -> TestResult {
        let product = latte();
        let config = Configuration::resolve(
            &product,
            Some("Grande"),
            Some("Yulaf Sütü"),
            &["Ekstra Shot"],
        );

        // 81.00 + 10.00 + 15.00 + 12.00
        assert_eq!(unit_price(&product, &config)?, Price::new(11_800));

        Ok(())
    }

    #[test]
    fn totals_of_empty_cart_are_zero() -> TestResult {
        let totals = cart_totals(&[], None, TRY)?;

        assert_eq!(totals.amounts(), Totals::default());
        assert_eq!(totals.item_count(), 0);
        assert_eq!(totals.total(), Money::from_minor(0, TRY));

        Ok(())
    }

    #[test]
    fn subtotal_sums_unit_price_times_quantity() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        cart.add_item(&product, 2, &Configuration::none(), "")?;
        cart.add_item(&product, 1, &Configuration::defaults(&product), "")?;

        let totals = cart_totals(cart.lines(), None, TRY)?;

        // 2 x 81.00 + 1 x 86.00
        assert_eq!(totals.subtotal(), Money::from_minor(24_800, TRY));
        assert_eq!(totals.item_count(), 3);

        Ok(())
    }

    #[test]
    fn percentage_coupon_then_tax() -> TestResult {
        let mut product = latte();
        product.price = Price::new(10_000);
        product.discount = percent_points(0);

        let mut cart = Cart::new();
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        let coupon = percent_coupon("ILK10", 10, 0);
        let totals = cart_totals(cart.lines(), Some(&coupon), TRY)?;

        assert_eq!(
            totals.amounts(),
            Totals {
                subtotal: Price::new(10_000),
                discount: Price::new(1000),
                tax: Price::new(1800),
                total: Price::new(10_800),
            }
        );

        Ok(())
    }

    #[test]
    fn fixed_coupon_is_capped_at_subtotal() -> TestResult {
        let mut product = latte();
        product.price = Price::new(2000);
        product.discount = percent_points(0);

        let mut cart = Cart::new();
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        let coupon = fixed_coupon("BEDAVA", 5000, 0);
        let totals = cart_totals(cart.lines(), Some(&coupon), TRY)?;

        assert_eq!(totals.discount(), Money::from_minor(2000, TRY));
        assert_eq!(totals.tax(), Money::from_minor(0, TRY));
        assert_eq!(totals.total(), Money::from_minor(0, TRY));

        Ok(())
    }

    #[test]
    fn coupon_minimum_is_not_enforced_by_totals() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        let coupon = percent_coupon("IKILIM20", 20, 1_000_000);
        let totals = cart_totals(cart.lines(), Some(&coupon), TRY)?;

        assert_eq!(totals.discount(), Money::from_minor(1620, TRY));

        Ok(())
    }
}
