//! Coupon Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    coupons::{Coupon, CouponDiscount},
    fixtures::{FixtureError, products::parse_price_in},
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupons
    pub coupons: Vec<CouponFixture>,
}

/// Coupon Fixture
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Coupon code
    pub code: String,

    /// Whether the coupon can be applied
    #[serde(default = "active")]
    pub is_active: bool,

    /// Either whole percent points ("15%") or a fixed amount ("25.00 TRY")
    pub discount: String,

    /// Minimum subtotal (e.g., "100.00 TRY")
    pub min_order_amount: String,

    /// Headline
    #[serde(default)]
    pub title: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

fn active() -> bool {
    true
}

impl CouponFixture {
    /// Build the coupon, checking every amount is in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if the discount or minimum is malformed or in another currency.
    pub fn try_into_coupon(self, currency: &'static Currency) -> Result<Coupon, FixtureError> {
        let discount = if self.discount.trim().ends_with('%') {
            CouponDiscount::Percentage(parse_percent_points(&self.discount)?)
        } else {
            CouponDiscount::Fixed(parse_price_in(&self.discount, currency)?)
        };

        Ok(Coupon {
            code: self.code.trim().to_string(),
            is_active: self.is_active,
            discount,
            min_order_amount: parse_price_in(&self.min_order_amount, currency)?,
            title: self.title,
            description: self.description,
        })
    }
}

/// Parse whole percent points (e.g., "15%" -> 15).
///
/// # Errors
///
/// Returns an error unless the string is a whole number from 0% to 100%.
pub fn parse_percent_points(s: &str) -> Result<u32, FixtureError> {
    let invalid = || FixtureError::InvalidPercentage(s.to_string());

    let value = s
        .trim()
        .strip_suffix('%')
        .ok_or_else(invalid)?
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| invalid())?;

    if !value.fract().is_zero() || value > Decimal::ONE_HUNDRED {
        return Err(invalid());
    }

    value.to_u32().ok_or_else(invalid)
}
