//! Catalog
//!
//! Read-only products and coupons the café offers.

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    coupons::Coupon,
    products::{Product, ProductId},
};

pub mod query;

pub use query::{MenuQuery, SortOrder};

/// Errors building a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two products share an id.
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),

    /// Two coupons share a code (ignoring case).
    #[error("duplicate coupon code {0}")]
    DuplicateCoupon(String),
}

/// Products and coupons, in catalog order.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    coupons: Vec<Coupon>,
    index: FxHashMap<ProductId, usize>,
    currency: &'static Currency,
}

impl Catalog {
    /// Create a catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if product ids or coupon codes are not unique.
    pub fn new(
        products: Vec<Product>,
        coupons: Vec<Coupon>,
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        let mut index = FxHashMap::default();

        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id, position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }

        for (position, coupon) in coupons.iter().enumerate() {
            if coupons
                .iter()
                .skip(position + 1)
                .any(|other| other.matches(&coupon.code))
            {
                return Err(CatalogError::DuplicateCoupon(coupon.code.clone()));
            }
        }

        Ok(Self {
            products,
            coupons,
            index,
            currency,
        })
    }

    /// Every product, in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Every coupon, active or not.
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Currency of every price in the catalog.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Look up a product.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.index
            .get(&id)
            .and_then(|&position| self.products.get(position))
    }

    /// Look up an active coupon by code, ignoring case.
    pub fn coupon(&self, code: &str) -> Option<&Coupon> {
        self.coupons
            .iter()
            .find(|coupon| coupon.is_active && coupon.matches(code))
    }

    /// Distinct categories, in the order they first appear.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for product in &self.products {
            if !categories.contains(&product.category.as_str()) {
                categories.push(&product.category);
            }
        }

        categories
    }

    /// Each category with the number of products in it.
    pub fn category_counts(&self) -> Vec<(&str, usize)> {
        self.categories()
            .into_iter()
            .map(|category| {
                let count = self
                    .products
                    .iter()
                    .filter(|product| product.category == category)
                    .count();

                (category, count)
            })
            .collect()
    }

    /// Run the menu filter, search and sort pipeline.
    pub fn query(&self, query: &MenuQuery) -> Vec<&Product> {
        query.apply(&self.products)
    }

    /// The first `limit` products on offer.
    pub fn daily_deals(&self, limit: usize) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| product.has_discount())
            .take(limit)
            .collect()
    }

    /// The first `limit` popular products.
    pub fn popular(&self, limit: usize) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| product.is_popular)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rusty_money::iso::TRY;
    use testresult::TestResult;

    use crate::{
        coupons::tests::percent_coupon,
        discounts::percent_points,
        prices::Price,
        products::tests::latte,
    };

    use super::*;

    fn product(id: u32, name: &str, category: &str, price: i64) -> Product {
        Product {
            id: ProductId(id),
            name: name.to_string(),
            category: category.to_string(),
            description: format!("{name} description"),
            price: Price::new(price),
            discount: percent_points(0),
            is_popular: false,
            ..latte()
        }
    }

    pub(crate) fn catalog() -> Result<Catalog, CatalogError> {
        let mut mocha = product(3, "Mocha", "Sıcak Kahveler", 9500);
        mocha.is_popular = true;
        mocha.discount = percent_points(15);

        let mut inactive = percent_coupon("ESKI50", 50, 0);
        inactive.is_active = false;

        Catalog::new(
            vec![
                latte(),
                product(2, "Iced Americano", "Soğuk Kahveler", 8000),
                mocha,
                product(4, "Limonata", "Serinletici İçecekler", 6000),
                product(5, "Karamel Frappe", "Frappeler", 11_000),
            ],
            vec![
                percent_coupon("ILK15", 15, 0),
                percent_coupon("IKILIM20", 20, 15_000),
                inactive,
            ],
            TRY,
        )
    }

    #[test]
    fn product_lookup_by_id() -> TestResult {
        let catalog = catalog()?;

        assert_eq!(catalog.product(ProductId(2)).map(|p| p.name.as_str()), Some("Iced Americano"));
        assert!(catalog.product(ProductId(42)).is_none());

        Ok(())
    }

    #[test]
    fn duplicate_product_ids_are_rejected() {
        let result = Catalog::new(vec![latte(), latte()], vec![], TRY);

        assert!(matches!(result, Err(CatalogError::DuplicateProduct(ProductId(1)))));
    }

    #[test]
    fn duplicate_coupon_codes_are_rejected() {
        let result = Catalog::new(
            vec![],
            vec![percent_coupon("ILK15", 15, 0), percent_coupon("ilk15", 10, 0)],
            TRY,
        );

        assert!(matches!(result, Err(CatalogError::DuplicateCoupon(_))));
    }

    #[test]
    fn coupon_lookup_ignores_case_and_inactive_coupons() -> TestResult {
        let catalog = catalog()?;

        assert_eq!(catalog.coupon("ilk15").map(|c| c.code.as_str()), Some("ILK15"));
        assert!(catalog.coupon("ESKI50").is_none());
        assert!(catalog.coupon("NOPE").is_none());

        Ok(())
    }

    #[test]
    fn categories_keep_first_seen_order() -> TestResult {
        let catalog = catalog()?;

        assert_eq!(
            catalog.categories(),
            vec!["Sıcak Kahveler", "Soğuk Kahveler", "Serinletici İçecekler", "Frappeler"]
        );
        assert_eq!(catalog.category_counts().first(), Some(&("Sıcak Kahveler", 2)));

        Ok(())
    }

    #[test]
    fn deals_and_popular_picks() -> TestResult {
        let catalog = catalog()?;

        let deals: Vec<u32> = catalog.daily_deals(2).iter().map(|p| p.id.0).collect();
        let popular: Vec<u32> = catalog.popular(5).iter().map(|p| p.id.0).collect();

        assert_eq!(deals, vec![1, 3]);
        assert_eq!(popular, vec![1, 3]);
        assert_eq!(catalog.daily_deals(1).len(), 1);

        Ok(())
    }
}
