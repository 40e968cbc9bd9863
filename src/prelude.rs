//! Crema prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartLine, LineKey},
    catalog::{Catalog, CatalogError, MenuQuery, SortOrder},
    coupons::{Coupon, CouponDiscount, CouponRejection},
    discounts::DiscountError,
    fixtures::{Fixture, FixtureError},
    orders::{
        CheckoutDetails, Customer, DeliveryAddress, Order, OrderLine, OrderNumber, OrderStatus,
        PaymentMethod,
    },
    prices::Price,
    pricing::{CartTotals, PricingError, Totals, cart_totals},
    products::{Configuration, Product, ProductId, ProductOption},
    receipt::{Receipt, ReceiptError},
    storage::{FileStorage, MemoryStorage, Slot, Storage, StorageError},
    store::{Store, StoreError},
};
