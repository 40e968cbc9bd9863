//! Orders
//!
//! An order is an immutable snapshot of the cart taken at checkout, together with the
//! customer's delivery and payment details.

use std::fmt;

use jiff::Timestamp;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    cart::CartLine,
    prices::Price,
    pricing::{PricingError, Totals, line_total},
};

/// Human-facing order number, `ORD-YYYYMMDD-NNNN`.
///
/// The suffix is random and numbers are not checked for uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number for an order placed at `placed_at`, with a random 4-digit suffix.
    pub fn generate(placed_at: Timestamp, rng: &mut impl Rng) -> Self {
        let suffix: u16 = rng.gen_range(1000..10_000);

        Self(format!("ORD-{}-{suffix}", placed_at.strftime("%Y%m%d")))
    }

    /// The number as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderNumber {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order status. Orders start out preparing; nothing in this crate advances them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being prepared
    #[default]
    Preparing,

    /// Out for delivery
    OnTheWay,

    /// Delivered
    Delivered,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Preparing => "preparing",
            OrderStatus::OnTheWay => "on the way",
            OrderStatus::Delivered => "delivered",
        };

        f.write_str(label)
    }
}

/// Who placed the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name
    pub name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,
}

/// Where the order goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Street address
    pub address: String,

    /// District
    pub district: String,

    /// City
    pub city: String,

    /// Directions for the courier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directions: Option<String>,
}

/// How the customer pays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid online by card; only the holder and last four digits are kept
    Card {
        /// Name on the card
        holder: String,

        /// Last four digits of the card number
        last_four: String,
    },

    /// Cash handed to the courier
    #[default]
    CashOnDelivery,

    /// Card terminal brought by the courier
    CardOnDelivery,
}

/// Everything the checkout form supplies. Not validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    /// Customer
    pub customer: Customer,

    /// Delivery address
    pub address: DeliveryAddress,

    /// Payment method
    pub payment: PaymentMethod,

    /// Note for the whole order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A cart line copied into an order, with its line total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The cart line as it was at checkout
    #[serde(flatten)]
    pub line: CartLine,

    /// Unit price times quantity
    pub line_total: Price,
}

impl OrderLine {
    /// Copy a cart line into an order.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the line total overflows.
    pub fn from_cart_line(line: &CartLine) -> Result<Self, PricingError> {
        Ok(Self {
            line_total: line_total(line)?,
            line: line.clone(),
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order number
    pub number: OrderNumber,

    /// When the order was placed
    pub placed_at: Timestamp,

    /// Order status
    pub status: OrderStatus,

    /// Lines as they were at checkout
    pub lines: Vec<OrderLine>,

    /// Units across all lines
    pub item_count: u32,

    /// Code of the coupon applied at checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,

    /// Customer, delivery and payment details
    pub details: CheckoutDetails,

    /// Totals at checkout
    pub totals: Totals,
}
