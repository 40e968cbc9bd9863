//! Product Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::iso::{Currency, EUR, GBP, TRY, USD};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    prices::Price,
    products::{Nutrition, Product, ProductId, ProductOption},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Products in menu order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product identifier
    pub id: u32,

    /// Product name
    pub name: String,

    /// Menu category
    pub category: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Image path or URL
    #[serde(default)]
    pub image: String,

    /// Base price (e.g., "95.00 TRY")
    pub price: String,

    /// Catalog markdown (e.g., "10%")
    #[serde(default)]
    pub discount: Option<String>,

    /// Popular pick
    #[serde(default)]
    pub is_popular: bool,

    /// New on the menu
    #[serde(default)]
    pub is_new: bool,

    /// Nutrition facts
    #[serde(default)]
    pub nutrition: Option<NutritionFixture>,

    /// Size options
    #[serde(default)]
    pub sizes: Vec<OptionFixture>,

    /// Milk options
    #[serde(default)]
    pub milk_options: Vec<OptionFixture>,

    /// Extra options
    #[serde(default)]
    pub extras: Vec<OptionFixture>,
}

/// Option Fixture
#[derive(Debug, Deserialize)]
pub struct OptionFixture {
    /// Option name
    pub name: String,

    /// Price delta (e.g., "10.00 TRY")
    pub price: String,
}

/// Nutrition Fixture
#[derive(Debug, Deserialize)]
pub struct NutritionFixture {
    /// Energy, kcal
    pub calories: u32,

    /// Protein, grams
    pub protein: f32,

    /// Fat, grams
    pub fat: f32,

    /// Carbohydrates, grams
    pub carbs: f32,
}

impl ProductFixture {
    /// Build the product, checking every price is in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if a price or percentage is malformed or in another currency.
    pub fn try_into_product(self, currency: &'static Currency) -> Result<Product, FixtureError> {
        let price = parse_price_in(&self.price, currency)?;

        let discount = match self.discount.as_deref() {
            Some(discount) => parse_percentage(discount)?,
            None => Percentage::from(0.0),
        };

        let nutrition = self.nutrition.map_or_else(Nutrition::default, |n| Nutrition {
            calories: n.calories,
            protein: n.protein,
            fat: n.fat,
            carbs: n.carbs,
        });

        Ok(Product {
            id: ProductId(self.id),
            name: self.name,
            category: self.category,
            description: self.description,
            image: self.image,
            price,
            discount,
            is_popular: self.is_popular,
            is_new: self.is_new,
            nutrition,
            sizes: parse_options(self.sizes, currency)?,
            milk_options: parse_options(self.milk_options, currency)?,
            extras: parse_options(self.extras, currency)?,
        })
    }
}

fn parse_options(
    options: Vec<OptionFixture>,
    currency: &'static Currency,
) -> Result<Vec<ProductOption>, FixtureError> {
    options
        .into_iter()
        .map(|option| {
            let price = parse_price_in(&option.price, currency)?;

            Ok(ProductOption::new(option.name, price))
        })
        .collect()
}

/// Parse a price and check its currency.
///
/// # Errors
///
/// Returns an error if the price is malformed or not in `currency`.
pub fn parse_price_in(s: &str, currency: &'static Currency) -> Result<Price, FixtureError> {
    let (minor_units, found) = parse_price(s)?;

    if found != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            found.iso_alpha_code.to_string(),
        ));
    }

    Ok(Price::new(minor_units))
}

/// Parse price string (e.g., "95.00 TRY") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "TRY" => TRY,
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string is not a number, or falls outside 0% to 100%.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let value = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?
            / Decimal::ONE_HUNDRED
    } else {
        trimmed
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?
    };

    if value.is_sign_negative() || value > Decimal::ONE {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(value))
}

#[cfg(test)]
mod tests {
    use crate::discounts::percent_points;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("95.00TRY");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price("-1.00 TRY");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_accepts_lira() -> Result<(), FixtureError> {
        let (minor, currency) = parse_price("95.50 TRY")?;

        assert_eq!(minor, 9550);
        assert_eq!(currency, TRY);

        Ok(())
    }

    #[test]
    fn parse_price_in_rejects_other_currencies() {
        let result = parse_price_in("1.00 USD", TRY);

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        assert_eq!(parse_percentage("15%")?, percent_points(15));
        assert_eq!(parse_percentage("  0.15 ")?, percent_points(15));
        assert_eq!(parse_percentage("100%")?, percent_points(100));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_out_of_range() {
        assert!(matches!(
            parse_percentage("120%"),
            Err(FixtureError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("-5%"),
            Err(FixtureError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("invalid"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn product_fixture_defaults_optional_fields() -> Result<(), FixtureError> {
        let fixture: ProductFixture = serde_norway::from_str(
            "id: 7\nname: Su\ncategory: Serinletici İçecekler\nprice: 20.00 TRY\n",
        )?;

        let product = fixture.try_into_product(TRY)?;

        assert_eq!(product.id, ProductId(7));
        assert_eq!(product.price, Price::new(2000));
        assert!(!product.has_discount());
        assert!(product.sizes.is_empty());
        assert!(product.description.is_empty());

        Ok(())
    }
}
