//! Cart
//!
//! The cart keeps one line per distinct product configuration. Adding a configuration that is
//! already in the cart increases that line's quantity rather than creating a second line.

use serde::{Deserialize, Serialize};

use crate::{
    prices::Price,
    pricing::{PricingError, unit_price},
    products::{Configuration, Product, ProductId, ProductOption},
};

/// Identity of a cart line: the product plus the names of its selected options.
///
/// Extras are kept sorted so selection order does not matter. Keys compare structurally, so
/// option names containing separators can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    /// Product in the line
    pub product: ProductId,

    /// Selected size name
    pub size: Option<String>,

    /// Selected milk name
    pub milk: Option<String>,

    /// Selected extra names, sorted
    pub extras: Vec<String>,
}

impl LineKey {
    /// Derive the key for a product in a configuration.
    pub fn new(product: ProductId, config: &Configuration<'_>) -> Self {
        let mut extras: Vec<String> = config
            .extras
            .iter()
            .map(|extra| extra.name.clone())
            .collect();

        extras.sort_unstable();
        extras.dedup();

        Self {
            product,
            size: config.size.map(|size| size.name.clone()),
            milk: config.milk.map(|milk| milk.name.clone()),
            extras,
        }
    }
}

/// One distinct product configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identity
    #[serde(rename = "item_id")]
    pub key: LineKey,

    /// Product name at the time it was added
    pub name: String,

    /// Product image at the time it was added
    pub image: String,

    /// Product category at the time it was added
    pub category: String,

    /// Selected size and its price delta
    pub size: Option<ProductOption>,

    /// Selected milk and its price delta
    pub milk: Option<ProductOption>,

    /// Selected extras and their price deltas
    pub extras: Vec<ProductOption>,

    /// Price of one unit, fixed when the line was created
    pub unit_price: Price,

    /// Units in the line, never zero
    pub quantity: u32,

    /// Customer note for the barista
    pub note: Option<String>,
}

impl CartLine {
    /// Product in the line
    pub fn product_id(&self) -> ProductId {
        self.key.product
    }

    fn new(
        key: LineKey,
        product: &Product,
        config: &Configuration<'_>,
        quantity: u32,
        note: Option<String>,
    ) -> Result<Self, PricingError> {
        Ok(Self {
            key,
            name: product.name.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            size: config.size.cloned(),
            milk: config.milk.cloned(),
            extras: config.extras.iter().map(|&extra| extra.clone()).collect(),
            unit_price: unit_price(product, config)?,
            quantity,
            note,
        })
    }
}

/// Cart lines, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart from previously stored lines.
    ///
    /// Lines with a zero quantity are dropped.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        Self {
            lines: lines.into_iter().filter(|line| line.quantity > 0).collect(),
        }
    }

    /// The lines in the cart.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find a line by its key.
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add units of a product in a configuration.
    ///
    /// If a line with the same configuration exists its quantity grows by `quantity`, and its note
    /// is replaced only when `note` is not empty. Otherwise a new line is appended with its unit
    /// price fixed at the product's current price. Adding zero units creates nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the unit price cannot be represented.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: u32,
        config: &Configuration<'_>,
        note: &str,
    ) -> Result<LineKey, PricingError> {
        let key = LineKey::new(product.id, config);
        let note = (!note.is_empty()).then(|| note.to_string());

        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity = line.quantity.saturating_add(quantity);

            if note.is_some() {
                line.note = note;
            }

            return Ok(key);
        }

        if quantity == 0 {
            return Ok(key);
        }

        let line = CartLine::new(key.clone(), product, config, quantity, note)?;
        self.lines.push(line);

        Ok(key)
    }

    /// Set a line's quantity, removing the line when `quantity` is zero or negative.
    ///
    /// Returns whether a line was found. Unknown keys are ignored.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(quantity.max(0)) else {
            return self.set_quantity(key, u32::MAX);
        };

        if quantity == 0 {
            return self.remove_item(key);
        }

        self.set_quantity(key, quantity)
    }

    /// Remove a line. Returns whether a line was found.
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.key != key);

        self.lines.len() != before
    }

    /// Replace a line with a new configuration of a product.
    ///
    /// The old line is removed and the new configuration is added as usual, so it merges into
    /// any existing line with the same configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the unit price cannot be represented.
    pub fn update_item(
        &mut self,
        old_key: &LineKey,
        product: &Product,
        quantity: u32,
        config: &Configuration<'_>,
        note: &str,
    ) -> Result<LineKey, PricingError> {
        self.remove_item(old_key);

        self.add_item(product, quantity, config, note)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        match self.lines.iter_mut().find(|line| &line.key == key) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::products::tests::latte;

    use super::*;

    #[test]
    fn identical_configurations_merge_into_one_line() -> TestResult {
        let product = latte();
        let config = Configuration::defaults(&product);
        let mut cart = Cart::new();

        cart.add_item(&product, 1, &config, "")?;
        cart.add_item(&product, 2, &config, "")?;
        let key = cart.add_item(&product, 4, &config, "")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&key).map(|line| line.quantity), Some(7));

        Ok(())
    }

    #[test]
    fn extras_order_does_not_split_lines() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        let first =
            Configuration::resolve(&product, None, None, &["Ekstra Shot", "Karamel Şurup"]);
        let second =
            Configuration::resolve(&product, None, None, &["Karamel Şurup", "Ekstra Shot"]);

        cart.add_item(&product, 1, &first, "")?;
        cart.add_item(&product, 1, &second, "")?;

        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn distinct_configurations_get_distinct_lines() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        let configs = [
            Configuration::none(),
            Configuration::resolve(&product, Some("Tall"), None, &[] as &[&str]),
            Configuration::resolve(
                &product,
                Some("Tall"),
                Some("Yulaf Sütü"),
                &[] as &[&str],
            ),
            Configuration::resolve(
                &product,
                Some("Tall"),
                Some("Yulaf Sütü"),
                &["Ekstra Shot"],
            ),
        ];

        for config in &configs {
            cart.add_item(&product, 1, config, "")?;
        }

        assert_eq!(cart.len(), configs.len());

        Ok(())
    }

    #[test]
    fn unit_price_is_fixed_at_add_time() -> TestResult {
        let mut product = latte();
        let mut cart = Cart::new();

        let key = cart.add_item(&product, 1, &Configuration::none(), "")?;
        product.price = Price::new(20_000);
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        assert_eq!(
            cart.line(&key).map(|line| (line.unit_price, line.quantity)),
            Some((Price::new(8100), 2))
        );

        Ok(())
    }

    #[test]
    fn note_is_only_replaced_when_not_empty() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        let key = cart.add_item(&product, 1, &Configuration::none(), "extra hot")?;
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        assert_eq!(
            cart.line(&key).and_then(|line| line.note.as_deref()),
            Some("extra hot")
        );

        cart.add_item(&product, 1, &Configuration::none(), "  no foam  ")?;

        assert_eq!(
            cart.line(&key).and_then(|line| line.note.as_deref()),
            Some("  no foam  ")
        );

        cart.add_item(&product, 1, &Configuration::none(), "   ")?;

        assert_eq!(
            cart.line(&key).and_then(|line| line.note.as_deref()),
            Some("   "),
            "whitespace is still a note"
        );

        Ok(())
    }

    #[test]
    fn adding_zero_units_creates_no_line() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        cart.add_item(&product, 0, &Configuration::none(), "")?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_sets_or_removes() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();
        let key = cart.add_item(&product, 1, &Configuration::none(), "")?;

        assert!(cart.update_quantity(&key, 5));
        assert_eq!(cart.line(&key).map(|line| line.quantity), Some(5));

        assert!(cart.update_quantity(&key, 0));
        assert!(cart.is_empty());

        let key = cart.add_item(&product, 1, &Configuration::none(), "")?;
        assert!(cart.update_quantity(&key, -1));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_ignores_unknown_key() {
        let mut cart = Cart::new();
        let key = LineKey::new(ProductId(99), &Configuration::none());

        assert!(!cart.update_quantity(&key, 3));
        assert!(!cart.remove_item(&key));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_item_merges_into_existing_configuration() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();

        let tall = Configuration::resolve(&product, Some("Tall"), None, &[] as &[&str]);
        let grande = Configuration::resolve(&product, Some("Grande"), None, &[] as &[&str]);

        let tall_key = cart.add_item(&product, 2, &tall, "")?;
        cart.add_item(&product, 1, &grande, "")?;

        let new_key = cart.update_item(&tall_key, &product, 2, &grande, "")?;

        assert_eq!(cart.len(), 1);
        assert!(cart.line(&tall_key).is_none());
        assert_eq!(cart.line(&new_key).map(|line| line.quantity), Some(3));

        Ok(())
    }

    #[test]
    fn from_lines_drops_empty_lines() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();
        cart.add_item(&product, 1, &Configuration::none(), "")?;

        let mut lines = cart.lines().to_vec();
        if let Some(line) = lines.first_mut() {
            line.quantity = 0;
        }

        assert!(Cart::from_lines(lines).is_empty());

        Ok(())
    }

    #[test]
    fn serialized_cart_round_trips() -> TestResult {
        let product = latte();
        let mut cart = Cart::new();
        cart.add_item(&product, 2, &Configuration::defaults(&product), "to go")?;
        let shot = Configuration::resolve(&product, None, None, &["Ekstra Shot"]);
        cart.add_item(&product, 1, &shot, "")?;

        let json = serde_json::to_string(&cart)?;
        let restored: Cart = serde_json::from_str(&json)?;

        assert_eq!(restored, cart);

        Ok(())
    }
}
