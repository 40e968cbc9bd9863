//! Store
//!
//! The application's cart, applied coupon and order history, owned by whoever opens it and
//! written back to [`Storage`] after every change.

use jiff::Timestamp;
use rand::Rng;
use rusty_money::iso::Currency;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cart::{Cart, CartLine, LineKey},
    catalog::Catalog,
    coupons::{Coupon, CouponRejection},
    orders::{CheckoutDetails, Order, OrderLine, OrderNumber, OrderStatus},
    pricing::{CartTotals, PricingError, cart_totals},
    products::{Configuration, Product},
    storage::{Slot, Storage, load_or_default, save},
};

/// Errors returned by store operations.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// No order in the history has this number.
    #[error("order {0} not found")]
    OrderNotFound(OrderNumber),

    /// Checkout was attempted with nothing in the cart.
    #[error("cannot place an order for an empty cart")]
    EmptyCart,

    /// The coupon was not applied.
    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Cart, applied coupon and order history.
#[derive(Debug)]
pub struct Store<S: Storage> {
    storage: S,
    currency: &'static Currency,
    cart: Cart,
    coupon: Option<Coupon>,
    orders: Vec<Order>,
    latest_order: Option<Order>,
}

impl<S: Storage> Store<S> {
    /// Open a store, restoring whatever state `storage` holds.
    ///
    /// Missing or corrupt slots start out empty.
    pub fn open(storage: S, currency: &'static Currency) -> Self {
        let lines: Vec<CartLine> = load_or_default(&storage, Slot::Cart);
        let coupon = load_or_default::<Option<Coupon>, _>(&storage, Slot::AppliedCoupon)
            .filter(|coupon| {
                let well_formed = coupon.is_well_formed();

                if !well_formed {
                    warn!(code = %coupon.code, "stored coupon is out of range, dropping it");
                }

                well_formed
            });
        let orders: Vec<Order> = load_or_default(&storage, Slot::Orders);
        let latest_order: Option<Order> = load_or_default(&storage, Slot::LatestOrder);

        debug!(
            lines = lines.len(),
            coupon = coupon.as_ref().map(|c| c.code.as_str()),
            orders = orders.len(),
            "opened store"
        );

        Self {
            storage,
            currency,
            cart: Cart::from_lines(lines),
            coupon,
            orders,
            latest_order,
        }
    }

    /// Close the store, handing back its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Currency of every amount in the store
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Cart lines, in the order they were added
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Coupon currently applied to the cart
    pub fn applied_coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Whether the cart is empty
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Units across all cart lines
    pub fn item_count(&self) -> u32 {
        self.cart
            .lines()
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Add units of a product to the cart. See [`Cart::add_item`].
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError::Pricing`] if the unit price cannot be represented.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: u32,
        config: &Configuration<'_>,
        note: &str,
    ) -> Result<LineKey, StoreError> {
        let key = self.cart.add_item(product, quantity, config, note)?;

        debug!(product = %product.id, quantity, "added to cart");
        self.persist_cart();

        Ok(key)
    }

    /// Set a line's quantity, removing it at zero or below. Returns whether the line existed.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        let found = self.cart.update_quantity(key, quantity);

        if found {
            debug!(product = %key.product, quantity, "updated quantity");
            self.persist_cart();
        }

        found
    }

    /// Remove a line. Returns whether the line existed.
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let found = self.cart.remove_item(key);

        if found {
            debug!(product = %key.product, "removed from cart");
            self.persist_cart();
        }

        found
    }

    /// Replace a line with another configuration. See [`Cart::update_item`].
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError::Pricing`] if the unit price cannot be represented.
    pub fn update_item(
        &mut self,
        old_key: &LineKey,
        product: &Product,
        quantity: u32,
        config: &Configuration<'_>,
        note: &str,
    ) -> Result<LineKey, StoreError> {
        let key = self
            .cart
            .update_item(old_key, product, quantity, config, note)?;

        debug!(product = %product.id, quantity, "updated cart line");
        self.persist_cart();

        Ok(key)
    }

    /// Empty the cart and drop the applied coupon.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.coupon = None;

        debug!("cleared cart");
        self.persist_cart();
        self.persist_coupon();
    }

    /// Validate a code against the catalog and the current subtotal, and apply it.
    ///
    /// On failure the previously applied coupon, if any, stays applied. Once applied, a coupon
    /// is not re-checked when the cart changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Coupon`] when no active coupon has this code or the subtotal is
    /// below its minimum, or [`StoreError::Pricing`] if the subtotal cannot be computed.
    pub fn apply_coupon(&mut self, code: &str, catalog: &Catalog) -> Result<&Coupon, StoreError> {
        let coupon = catalog.coupon(code).ok_or(CouponRejection::InvalidCode)?;
        let subtotal = cart_totals(self.cart.lines(), None, self.currency)?
            .amounts()
            .subtotal;

        if let Err(rejection) = coupon.check_minimum(subtotal, self.currency) {
            debug!(code = %coupon.code, %rejection, "coupon rejected");

            return Err(rejection.into());
        }

        debug!(code = %coupon.code, "applied coupon");

        let coupon = self.coupon.insert(coupon.clone());
        save_or_warn(&mut self.storage, Slot::AppliedCoupon, &*coupon);

        Ok(coupon)
    }

    /// Drop the applied coupon, if any.
    pub fn remove_coupon(&mut self) {
        if self.coupon.take().is_some() {
            debug!("removed coupon");
        }

        self.persist_coupon();
    }

    /// Totals of the current cart, recomputed from its lines.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if an amount overflows.
    pub fn totals(&self) -> Result<CartTotals, PricingError> {
        cart_totals(self.cart.lines(), self.coupon.as_ref(), self.currency)
    }

    /// Place an order for the current cart, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyCart`] if there is nothing to order, or a pricing error.
    pub fn create_order(&mut self, details: CheckoutDetails) -> Result<&Order, StoreError> {
        self.create_order_at(details, Timestamp::now(), &mut rand::thread_rng())
    }

    /// Place an order for the current cart.
    ///
    /// The order snapshots the lines, totals and coupon code, goes to the front of the history
    /// and becomes the latest order. The cart and coupon are then cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyCart`] if there is nothing to order, or a pricing error.
    pub fn create_order_at(
        &mut self,
        details: CheckoutDetails,
        placed_at: Timestamp,
        rng: &mut impl Rng,
    ) -> Result<&Order, StoreError> {
        if self.cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let totals = self.totals()?;
        let lines = self
            .cart
            .lines()
            .iter()
            .map(OrderLine::from_cart_line)
            .collect::<Result<Vec<_>, _>>()?;

        let order = Order {
            number: OrderNumber::generate(placed_at, rng),
            placed_at,
            status: OrderStatus::Preparing,
            lines,
            item_count: totals.item_count(),
            coupon: self.coupon.as_ref().map(|coupon| coupon.code.clone()),
            details,
            totals: totals.amounts(),
        };

        info!(
            order = %order.number,
            items = order.item_count,
            total = %totals.total(),
            "order placed"
        );

        self.orders.insert(0, order.clone());
        self.cart.clear();
        self.coupon = None;

        save_or_warn(&mut self.storage, Slot::Orders, &self.orders);
        save_or_warn(&mut self.storage, Slot::LatestOrder, &order);
        self.persist_cart();
        self.persist_coupon();

        Ok(self.latest_order.insert(order))
    }

    /// Order history, newest first
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The most recently placed order
    pub fn latest_order(&self) -> Option<&Order> {
        self.latest_order.as_ref()
    }

    /// Look up an order by number.
    pub fn order(&self, number: &OrderNumber) -> Option<&Order> {
        self.orders.iter().find(|order| &order.number == number)
    }

    /// Add every line of a past order back to the cart at current catalog prices.
    ///
    /// Options are matched by name against the product as it is now; names it no longer offers
    /// are dropped. Lines whose product left the catalog are skipped. Returns the number of
    /// lines added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OrderNotFound`] if no order has this number, or a pricing error.
    pub fn reorder(&mut self, number: &OrderNumber, catalog: &Catalog) -> Result<usize, StoreError> {
        let lines: Vec<CartLine> = self
            .order(number)
            .ok_or_else(|| StoreError::OrderNotFound(number.clone()))?
            .lines
            .iter()
            .map(|line| line.line.clone())
            .collect();

        let mut added = 0;

        for line in &lines {
            let Some(product) = catalog.product(line.product_id()) else {
                debug!(product = %line.product_id(), "product no longer offered, skipping");
                continue;
            };

            let config = Configuration::resolve(
                product,
                line.key.size.as_deref(),
                line.key.milk.as_deref(),
                &line.key.extras,
            );

            self.cart.add_item(
                product,
                line.quantity,
                &config,
                line.note.as_deref().unwrap_or_default(),
            )?;

            added += 1;
        }

        info!(order = %number, added, skipped = lines.len() - added, "reordered");
        self.persist_cart();

        Ok(added)
    }

    fn persist_cart(&mut self) {
        save_or_warn(&mut self.storage, Slot::Cart, &self.cart);
    }

    fn persist_coupon(&mut self) {
        match &self.coupon {
            Some(coupon) => save_or_warn(&mut self.storage, Slot::AppliedCoupon, coupon),
            None => {
                if let Err(error) = self.storage.remove(Slot::AppliedCoupon) {
                    warn!(slot = %Slot::AppliedCoupon, %error, "could not remove state");
                }
            }
        }
    }
}

fn save_or_warn<S, T>(storage: &mut S, slot: Slot, value: &T)
where
    S: Storage,
    T: Serialize + ?Sized,
{
    if let Err(error) = save(storage, slot, value) {
        warn!(%slot, %error, "could not save state");
    }
}
