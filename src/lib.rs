//! Crema
//!
//! Crema is the cart, pricing, coupon and order engine behind a small café ordering site.
//! Everything runs locally: a static catalog, a cart whose totals are derived on every read,
//! and an order history persisted to named storage slots.

pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod orders;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod storage;
pub mod store;
