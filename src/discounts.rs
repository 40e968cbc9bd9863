//! Discounts
//!
//! Percentage arithmetic shared by product markdowns, percentage coupons and tax.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::prices::Price;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Builds a fractional percentage from whole percent points (`15` -> 15%).
pub fn percent_points(points: u32) -> Percentage {
    Percentage::from(Decimal::new(i64::from(points), 2))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half away from zero to the nearest minor unit.
///
/// # Errors
///
/// Returns an error if the percentage calculation overflows or cannot be safely represented
/// (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Calculate the percentage share of a price.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the amount cannot be represented.
pub fn percent_of(percent: &Percentage, price: Price) -> Result<Price, DiscountError> {
    percent_of_minor(percent, *price).map(Price::new)
}

/// Reduce a price by a percentage, e.g. a catalog markdown.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the amount cannot be represented.
pub fn mark_down(price: Price, percent: &Percentage) -> Result<Price, DiscountError> {
    let off = percent_of_minor(percent, *price)?;

    price
        .checked_sub(Price::new(off))
        .ok_or(DiscountError::PercentConversion)
}
