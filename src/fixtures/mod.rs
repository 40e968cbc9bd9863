//! Fixtures
//!
//! Catalog data loaded from YAML files laid out as `<base>/products/<set>.yml` and
//! `<base>/coupons/<set>.yml`.

use std::{fs, path::PathBuf};

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{Catalog, CatalogError},
    coupons::Coupon,
    fixtures::{
        coupons::CouponsFixture,
        products::{ProductsFixture, parse_price},
    },
    products::Product,
};

pub mod coupons;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between fixtures
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Loaded data does not form a valid catalog
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products, in file order
    products: Vec<Product>,

    /// Coupons, in file order
    coupons: Vec<Coupon>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: Vec::new(),
            coupons: Vec::new(),
            currency: None,
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        for product_fixture in fixture.products {
            let currency = self.currency_for(&product_fixture.price)?;
            let product = product_fixture.try_into_product(currency)?;

            self.products.push(product);
        }

        debug!(path = %file_path.display(), count = self.products.len(), "loaded products");

        Ok(self)
    }

    /// Load coupons from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("coupons").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CouponsFixture = serde_norway::from_str(&contents)?;

        for coupon_fixture in fixture.coupons {
            let currency = self.currency_for(&coupon_fixture.min_order_amount)?;
            let coupon = coupon_fixture.try_into_coupon(currency)?;

            self.coupons.push(coupon);
        }

        debug!(path = %file_path.display(), count = self.coupons.len(), "loaded coupons");

        Ok(self)
    }

    /// Load a complete fixture set (products and coupons with the same name) from the
    /// default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::new().with_set(name)
    }

    /// Load a complete fixture set into this fixture
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn with_set(mut self, name: &str) -> Result<Self, FixtureError> {
        self.load_products(name)?.load_coupons(name)?;

        Ok(self)
    }

    /// Get all products
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Get all coupons
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Build a catalog from everything loaded
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been loaded, or product ids or coupon codes repeat.
    pub fn catalog(&self) -> Result<Catalog, FixtureError> {
        let currency = self.currency()?;

        Ok(Catalog::new(
            self.products.clone(),
            self.coupons.clone(),
            currency,
        )?)
    }

    /// Currency of an amount, fixing the fixture currency on first use.
    fn currency_for(&mut self, amount: &str) -> Result<&'static Currency, FixtureError> {
        let (_minor_units, currency) = parse_price(amount)?;

        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(existing) => Ok(existing),
            None => {
                self.currency = Some(currency);

                Ok(currency)
            }
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rusty_money::iso::TRY;
    use testresult::TestResult;

    use crate::{coupons::CouponDiscount, prices::Price, products::ProductId};

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_loads_cafe_set() -> TestResult {
        let fixture = Fixture::from_set("cafe")?;

        assert_eq!(fixture.products().len(), 12);
        assert_eq!(fixture.coupons().len(), 5);
        assert_eq!(fixture.currency()?, TRY);

        let latte = fixture
            .products()
            .first()
            .ok_or("expected at least one product")?;

        assert_eq!(latte.name, "Caffè Latte");
        assert_eq!(latte.price, Price::new(9500));
        assert_eq!(latte.size("Grande").map(|s| s.price), Some(Price::new(2000)));

        Ok(())
    }

    #[test]
    fn fixture_builds_catalog() -> TestResult {
        let catalog = Fixture::from_set("cafe")?.catalog()?;

        assert!(catalog.product(ProductId(12)).is_some());
        assert_eq!(
            catalog.coupon("hosgeldin25").map(|c| c.discount),
            Some(CouponDiscount::Fixed(Price::new(2500)))
        );
        assert!(catalog.coupon("YAZ50").is_none(), "inactive coupons never resolve");

        Ok(())
    }

    #[test]
    fn fixture_no_currency_returns_error() {
        let fixture = Fixture::new();

        assert!(matches!(fixture.currency(), Err(FixtureError::NoCurrency)));
        assert!(matches!(fixture.catalog(), Err(FixtureError::NoCurrency)));
    }

    #[test]
    fn fixture_missing_file_returns_io_error() {
        let mut fixture = Fixture::new();
        let result = fixture.load_products("nonexistent");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }

    #[test]
    fn fixture_rejects_currency_mismatch_across_files() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "mixed",
            "products:\n  - id: 1\n    name: Çay\n    category: Sıcak\n    price: 20.00 TRY\n",
        )?;

        write_fixture(
            dir.path(),
            "coupons",
            "mixed",
            "coupons:\n  - code: FIVE\n    discount: 5.00 USD\n    min_order_amount: 0.00 USD\n",
        )?;

        let result = Fixture::with_base_path(dir.path()).with_set("mixed");

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));

        Ok(())
    }

    #[test]
    fn fixture_rejects_duplicate_product_ids() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "dupes",
            "products:\n  - id: 1\n    name: Çay\n    category: Sıcak\n    price: 20.00 TRY\n  - id: 1\n    name: Su\n    category: Soğuk\n    price: 10.00 TRY\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_products("dupes")?;

        assert!(matches!(
            fixture.catalog(),
            Err(FixtureError::Catalog(CatalogError::DuplicateProduct(_)))
        ));

        Ok(())
    }

    #[test]
    fn fixture_default_matches_new() {
        let fixture = Fixture::default();

        assert_eq!(fixture.base_path, PathBuf::from("./fixtures"));
        assert!(fixture.products.is_empty());
        assert!(fixture.coupons.is_empty());
    }
}
