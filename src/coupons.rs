//! Coupons

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, percent_of, percent_points},
    prices::Price,
};

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", content = "discount_value", rename_all = "snake_case")]
pub enum CouponDiscount {
    /// Take whole percent points off the subtotal
    Percentage(u32),

    /// Take a fixed amount off the subtotal
    Fixed(Price),
}

impl CouponDiscount {
    /// Discount this rule grants on the given subtotal.
    ///
    /// The discount never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage cannot be represented in minor units.
    pub fn amount_off(&self, subtotal: Price) -> Result<Price, DiscountError> {
        match self {
            CouponDiscount::Percentage(points) => {
                Ok(percent_of(&percent_points(*points), subtotal)?.min(subtotal))
            }
            CouponDiscount::Fixed(value) => Ok((*value).min(subtotal).max(Price::ZERO)),
        }
    }

    /// At most 100 percent, or a non-negative amount.
    pub fn is_valid(&self) -> bool {
        match self {
            CouponDiscount::Percentage(points) => *points <= 100,
            CouponDiscount::Fixed(value) => **value >= 0,
        }
    }
}

/// A code-activated discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Code customers type in; matched case-insensitively
    pub code: String,

    /// Inactive coupons never validate
    pub is_active: bool,

    /// Discount rule
    #[serde(flatten)]
    pub discount: CouponDiscount,

    /// Subtotal required before the coupon applies
    pub min_order_amount: Price,

    /// Headline shown in promotions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Longer description shown in promotions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Coupon {
    /// Whether this coupon answers to the given code, ignoring case and surrounding whitespace.
    pub fn matches(&self, code: &str) -> bool {
        self.code.trim().to_lowercase() == code.trim().to_lowercase()
    }

    /// Whether the discount rule and minimum are within range.
    pub fn is_well_formed(&self) -> bool {
        self.discount.is_valid() && *self.min_order_amount >= 0
    }

    /// Check the coupon against the current subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CouponRejection::MinimumNotMet`] when the subtotal is below the minimum order amount.
    pub fn check_minimum(
        &self,
        subtotal: Price,
        currency: &'static Currency,
    ) -> Result<(), CouponRejection> {
        if subtotal < self.min_order_amount {
            return Err(CouponRejection::MinimumNotMet {
                minimum: self.min_order_amount.to_money(currency),
            });
        }

        Ok(())
    }
}

/// Reasons a coupon code was not applied.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CouponRejection {
    /// No active coupon has this code.
    #[error("invalid coupon code")]
    InvalidCode,

    /// The subtotal is below the coupon's minimum order amount.
    #[error("minimum order amount of {minimum} not met")]
    MinimumNotMet {
        /// Minimum subtotal required
        minimum: Money<'static, Currency>,
    },
}

#[cfg(test)]
pub(crate) mod tests {
    use rusty_money::iso::TRY;
    use testresult::TestResult;

    use super::*;

    pub(crate) fn percent_coupon(code: &str, points: u32, minimum: i64) -> Coupon {
        Coupon {
            code: code.to_string(),
            is_active: true,
            discount: CouponDiscount::Percentage(points),
            min_order_amount: Price::new(minimum),
            title: None,
            description: None,
        }
    }

    pub(crate) fn fixed_coupon(code: &str, value: i64, minimum: i64) -> Coupon {
        Coupon {
            discount: CouponDiscount::Fixed(Price::new(value)),
            ..percent_coupon(code, 0, minimum)
        }
    }

    #[test]
    fn matches_ignores_case_and_whitespace() {
        let coupon = percent_coupon("ILK15", 15, 0);

        assert!(coupon.matches("ilk15"));
        assert!(coupon.matches("  Ilk15 "));
        assert!(!coupon.matches("ILK16"));
    }

    #[test]
    fn percentage_amount_off() -> TestResult {
        let coupon = percent_coupon("ILK15", 10, 0);

        assert_eq!(coupon.discount.amount_off(Price::new(10_000))?, Price::new(1000));

        Ok(())
    }

    #[test]
    fn percentage_above_hundred_is_clamped_to_subtotal() -> TestResult {
        let coupon = percent_coupon("BOZUK", 150, 0);

        assert_eq!(coupon.discount.amount_off(Price::new(8100))?, Price::new(8100));
        assert!(!coupon.is_well_formed(), "150% is out of range");
        assert!(percent_coupon("TAM", 100, 0).is_well_formed());

        Ok(())
    }

    #[test]
    fn negative_amounts_are_not_well_formed() {
        assert!(!fixed_coupon("EKSI", -500, 0).is_well_formed());
        assert!(!percent_coupon("ILK15", 15, -1).is_well_formed());
        assert!(fixed_coupon("HOSGELDIN", 2500, 15_000).is_well_formed());
    }

    #[test]
    fn fixed_amount_off_is_clamped_to_subtotal() -> TestResult {
        let coupon = fixed_coupon("HOSGELDIN", 5000, 0);

        assert_eq!(coupon.discount.amount_off(Price::new(12_000))?, Price::new(5000));
        assert_eq!(coupon.discount.amount_off(Price::new(3000))?, Price::new(3000));

        Ok(())
    }

    #[test]
    fn check_minimum_reports_threshold() {
        let coupon = percent_coupon("IKILIM20", 20, 15_000);

        assert_eq!(coupon.check_minimum(Price::new(15_000), TRY), Ok(()));
        assert_eq!(
            coupon.check_minimum(Price::new(14_999), TRY),
            Err(CouponRejection::MinimumNotMet {
                minimum: Money::from_minor(15_000, TRY)
            })
        );
    }

    #[test]
    fn rejection_messages() {
        let amount = Money::from_minor(15_050, TRY);
        let minimum = CouponRejection::MinimumNotMet { minimum: amount };

        assert_eq!(CouponRejection::InvalidCode.to_string(), "invalid coupon code");
        assert_eq!(
            minimum.to_string(),
            format!("minimum order amount of {amount} not met")
        );
        assert!(minimum.to_string().contains('₺'), "got {minimum}");
    }

    #[test]
    fn serializes_discount_type_and_value() -> TestResult {
        let json = serde_json::to_value(percent_coupon("MIEL10", 10, 0))?;

        assert_eq!(json["discount_type"], "percentage");
        assert_eq!(json["discount_value"], 10);
        assert_eq!(json["code"], "MIEL10");

        Ok(())
    }
}
