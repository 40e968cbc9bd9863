//! Products

use std::fmt;

use decimal_percentage::Percentage;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    discounts::{DiscountError, mark_down},
    prices::Price,
};

/// Size offered by default when a product has one with this name.
pub const DEFAULT_SIZE: &str = "Tall";

/// Milk offered by default when a product has one with this name.
pub const DEFAULT_MILK: &str = "Standart Süt";

/// Product identifier, as it appears in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named choice within an option group (a size, a milk, an extra) and the amount it adds
/// to the product's price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name, unique within its group
    pub name: String,

    /// Price delta added to the unit price when selected
    pub price: Price,
}

impl ProductOption {
    /// Create a new option.
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Nutrition facts shown on the product page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Nutrition {
    /// Energy, kcal
    pub calories: u32,

    /// Protein, grams
    pub protein: f32,

    /// Fat, grams
    pub fat: f32,

    /// Carbohydrates, grams
    pub carbs: f32,
}

/// Product
#[derive(Debug, Clone)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Menu category
    pub category: String,

    /// Short description
    pub description: String,

    /// Image path or URL
    pub image: String,

    /// Base price, before any markdown
    pub price: Price,

    /// Catalog markdown, zero when the product is not on offer
    pub discount: Percentage,

    /// Shown in the "popular" picks
    pub is_popular: bool,

    /// Shown with a "new" badge
    pub is_new: bool,

    /// Nutrition facts
    pub nutrition: Nutrition,

    /// Size options
    pub sizes: Vec<ProductOption>,

    /// Milk options
    pub milk_options: Vec<ProductOption>,

    /// Extra options
    pub extras: Vec<ProductOption>,
}

impl Product {
    /// Whether the product carries a catalog markdown.
    pub fn has_discount(&self) -> bool {
        self.discount != Percentage::from(0.0)
    }

    /// Base price with the catalog markdown applied.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the markdown cannot be represented in minor units.
    pub fn discounted_price(&self) -> Result<Price, DiscountError> {
        mark_down(self.price, &self.discount)
    }

    /// Find a size option by name.
    pub fn size(&self, name: &str) -> Option<&ProductOption> {
        find_option(&self.sizes, name)
    }

    /// Find a milk option by name.
    pub fn milk(&self, name: &str) -> Option<&ProductOption> {
        find_option(&self.milk_options, name)
    }

    /// Find an extra option by name.
    pub fn extra(&self, name: &str) -> Option<&ProductOption> {
        find_option(&self.extras, name)
    }
}

fn find_option<'p>(options: &'p [ProductOption], name: &str) -> Option<&'p ProductOption> {
    options.iter().find(|option| option.name == name)
}

/// The options picked for one product: at most one size, at most one milk, any extras.
///
/// Options are borrowed from the product itself, so a configuration can only name options
/// the product actually offers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration<'p> {
    /// Selected size
    pub size: Option<&'p ProductOption>,

    /// Selected milk
    pub milk: Option<&'p ProductOption>,

    /// Selected extras, in selection order
    pub extras: SmallVec<[&'p ProductOption; 4]>,
}

impl<'p> Configuration<'p> {
    /// A configuration with nothing selected.
    pub fn none() -> Self {
        Self::default()
    }

    /// The product page's starting selection: the default size and milk if offered, otherwise
    /// the first of each, and no extras.
    pub fn defaults(product: &'p Product) -> Self {
        Self {
            size: product
                .size(DEFAULT_SIZE)
                .or_else(|| product.sizes.first()),
            milk: product
                .milk(DEFAULT_MILK)
                .or_else(|| product.milk_options.first()),
            extras: SmallVec::new(),
        }
    }

    /// Re-resolve a selection by option names against the product's current options.
    ///
    /// Names the product no longer offers are dropped and repeated extras collapse into one.
    pub fn resolve<S: AsRef<str>>(
        product: &'p Product,
        size: Option<&str>,
        milk: Option<&str>,
        extras: &[S],
    ) -> Self {
        let mut config = Self {
            size: size.and_then(|name| product.size(name)),
            milk: milk.and_then(|name| product.milk(name)),
            extras: SmallVec::new(),
        };

        for name in extras {
            if let Some(extra) = product.extra(name.as_ref()) {
                config.toggle_extra_on(extra);
            }
        }

        config
    }

    /// Select a size.
    #[must_use]
    pub fn with_size(mut self, size: &'p ProductOption) -> Self {
        self.size = Some(size);
        self
    }

    /// Select a milk option.
    #[must_use]
    pub fn with_milk(mut self, milk: &'p ProductOption) -> Self {
        self.milk = Some(milk);
        self
    }

    /// Add an extra, ignoring it if already selected.
    #[must_use]
    pub fn with_extra(mut self, extra: &'p ProductOption) -> Self {
        self.toggle_extra_on(extra);
        self
    }

    /// Sum of the selected options' price deltas.
    pub fn options_price(&self) -> Option<Price> {
        self.size
            .into_iter()
            .chain(self.milk)
            .chain(self.extras.iter().copied())
            .try_fold(Price::ZERO, |acc, option| acc.checked_add(option.price))
    }

    fn toggle_extra_on(&mut self, extra: &'p ProductOption) {
        if !self.extras.iter().any(|selected| selected.name == extra.name) {
            self.extras.push(extra);
        }
    }
}
