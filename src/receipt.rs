//! Receipt
//!
//! Terminal tables for the menu, the cart and placed orders.

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::CartLine,
    coupons::{Coupon, CouponDiscount},
    discounts::DiscountError,
    orders::Order,
    prices::Price,
    pricing::{CartTotals, PricingError, TAX_PERCENT_POINTS, Totals, line_total},
    products::Product,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error pricing a line.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Error applying a markdown.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Priced lines ready to print, from the cart or from an order.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    /// Lines in display order
    lines: SmallVec<[&'a CartLine; 8]>,

    /// Amounts at the time the receipt was taken
    totals: Totals,

    /// Code of the applied coupon
    coupon: Option<&'a str>,

    /// Currency used for all monetary values
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Receipt for the current cart.
    pub fn for_cart(
        lines: &'a [CartLine],
        totals: &CartTotals,
        coupon: Option<&'a Coupon>,
    ) -> Self {
        Self {
            lines: lines.iter().collect(),
            totals: totals.amounts(),
            coupon: coupon.map(|coupon| coupon.code.as_str()),
            currency: totals.currency(),
        }
    }

    /// Receipt for a placed order, using the totals recorded at checkout.
    pub fn for_order(order: &'a Order, currency: &'static Currency) -> Self {
        Self {
            lines: order.lines.iter().map(|line| &line.line).collect(),
            totals: order.totals,
            coupon: order.coupon.as_deref(),
            currency,
        }
    }

    /// Coupon discount as a share of the subtotal.
    pub fn savings_percent(&self) -> Percentage {
        let subtotal = *self.totals.subtotal;

        if subtotal == 0 {
            return Percentage::from(0.0);
        }

        let discount = Decimal::from_i64(*self.totals.discount).unwrap_or(Decimal::ZERO);
        let subtotal = Decimal::from_i64(subtotal).unwrap_or(Decimal::ONE);

        Percentage::from(discount / subtotal)
    }

    /// Write the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a line cannot be priced or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Options", "Qty", "Unit Price", "Line Total"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line_label(line),
                option_summary(line),
                line.quantity.to_string(),
                self.money(line.unit_price).to_string(),
                self.money(line_total(line)?).to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..6), Alignment::right());

        for row in 1..=self.lines.len() {
            table.modify((row, 2), Color::FG_BRIGHT_BLACK);
        }

        let table_str = dim_borders(&table.to_string());

        writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let discount_label = match self.coupon {
            Some(code) => format!("Discount ({code}):"),
            None => "Discount:".to_string(),
        };

        let savings_points = percent_points_from_fractional_percentage(self.savings_percent());

        let mut builder = Builder::default();

        builder.push_record([
            "Subtotal:".to_string(),
            self.money(self.totals.subtotal).to_string(),
        ]);
        builder.push_record([
            discount_label,
            format!("({savings_points}%) -{}", self.money(self.totals.discount)),
        ]);
        builder.push_record([
            format!("Tax ({TAX_PERCENT_POINTS}%):"),
            self.money(self.totals.tax).to_string(),
        ]);
        builder.push_record([
            "Total:".to_string(),
            self.money(self.totals.total).to_string(),
        ]);

        let mut summary = builder.build();

        summary.with(Style::blank());
        summary.modify(Columns::new(0..2), Alignment::right());
        summary.modify(Rows::last(), Color::BOLD);

        writeln!(out, "{summary}\n").map_err(|_err| ReceiptError::IO)
    }

    fn money(&self, price: Price) -> Money<'static, Currency> {
        price.to_money(self.currency)
    }
}

/// Write the menu as a table: id, name, category, price and any markdown.
///
/// # Errors
///
/// Returns an error if a markdown cannot be applied or the output cannot be written.
pub fn write_menu(
    mut out: impl io::Write,
    products: &[&Product],
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Product", "Category", "Price", "Offer", ""]);

    let mut offer_rows: SmallVec<[usize; 8]> = SmallVec::new();

    for (idx, product) in products.iter().enumerate() {
        let offer = if product.has_discount() {
            offer_rows.push(idx + 1);

            format!(
                "({}%) {}",
                percent_points_from_fractional_percentage(product.discount).normalize(),
                product.discounted_price()?.to_money(currency)
            )
        } else {
            String::new()
        };

        let mut badges = Vec::new();

        if product.is_popular {
            badges.push("popular");
        }

        if product.is_new {
            badges.push("new");
        }

        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            product.price.to_money(currency).to_string(),
            offer,
            badges.join(", "),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..5), Alignment::right());

    for row in offer_rows {
        table.modify((row, 4), Color::FG_GREEN);
    }

    let table_str = dim_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

/// Write a one-line description of each coupon.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_coupons<'c>(
    mut out: impl io::Write,
    coupons: impl IntoIterator<Item = &'c Coupon>,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    for coupon in coupons {
        let discount = match coupon.discount {
            CouponDiscount::Percentage(points) => format!("{points}% off"),
            CouponDiscount::Fixed(value) => format!("{} off", value.to_money(currency)),
        };

        let minimum = if *coupon.min_order_amount > 0 {
            format!(", orders over {}", coupon.min_order_amount.to_money(currency))
        } else {
            String::new()
        };

        writeln!(
            out,
            " \x1b[1m{}\x1b[0m  {discount}{minimum}  \x1b[90m{}\x1b[0m",
            coupon.code,
            coupon.title.as_deref().unwrap_or_default()
        )
        .map_err(|_err| ReceiptError::IO)?;
    }

    Ok(())
}

fn line_label(line: &CartLine) -> String {
    match &line.note {
        Some(note) => format!("{}\n“{note}”", line.name),
        None => line.name.clone(),
    }
}

fn option_summary(line: &CartLine) -> String {
    line.size
        .iter()
        .chain(&line.milk)
        .chain(&line.extras)
        .map(|option| option.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Dims every run of box-drawing characters in a rendered table.
fn dim_borders(table: &str) -> String {
    const DIM: &str = "\x1b[90m";
    const RESET: &str = "\x1b[0m";

    let is_border = |ch: &char| ('\u{2500}'..='\u{257F}').contains(ch);
    let mut out = String::with_capacity(table.len() * 2);
    let mut chars = table.chars().peekable();

    while let Some(ch) = chars.next() {
        if !is_border(&ch) {
            out.push(ch);
            continue;
        }

        out.push_str(DIM);
        out.push(ch);

        while let Some(next) = chars.next_if(is_border) {
            out.push(next);
        }

        out.push_str(RESET);
    }

    out
}
