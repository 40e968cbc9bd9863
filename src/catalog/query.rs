//! Menu query

use clap::ValueEnum;

use crate::products::Product;

/// Order of menu results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Catalog order
    #[default]
    Default,

    /// Cheapest base price first
    PriceAsc,

    /// Most expensive base price first
    PriceDesc,
}

/// Menu filter, search and sort settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuQuery {
    /// Only show this category, or every category when `None`
    pub category: Option<String>,

    /// Case-insensitive text matched against name, description and category
    pub search: String,

    /// Result order
    pub sort: SortOrder,
}

impl MenuQuery {
    /// A query that returns the whole menu in catalog order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one category.
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Search for text.
    #[must_use]
    pub fn matching(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sort results.
    #[must_use]
    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Filter and sort products. Sorting is stable, so equal prices keep catalog order.
    pub fn apply<'p>(&self, products: &'p [Product]) -> Vec<&'p Product> {
        let needle = self.search.trim().to_lowercase();

        let mut results: Vec<&Product> = products
            .iter()
            .filter(|product| {
                self.category
                    .as_deref()
                    .is_none_or(|category| product.category == category)
            })
            .filter(|product| needle.is_empty() || matches_search(product, &needle))
            .collect();

        match self.sort {
            SortOrder::Default => {}
            SortOrder::PriceAsc => results.sort_by_key(|product| product.price),
            SortOrder::PriceDesc => {
                results.sort_by_key(|product| std::cmp::Reverse(product.price));
            }
        }

        results
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    [&product.name, &product.description, &product.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
