//! Crema CLI
//!
//! Browse the menu, fill a cart and place orders from the terminal. State lives in a directory
//! of JSON files so it survives between invocations.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crema::{
    prelude::*,
    receipt::{write_coupons, write_menu},
};

/// Products shown under "daily deals".
const DAILY_DEALS: usize = 2;

/// Products shown under "popular".
const POPULAR_PICKS: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "crema", about = "Café cart, coupons and orders", long_about = None)]
struct Cli {
    /// Directory holding the persisted cart, coupon and order history
    #[arg(long, env = "CREMA_STATE_DIR", default_value = "./.crema", global = true)]
    state_dir: PathBuf,

    /// Directory holding catalog fixtures
    #[arg(long, env = "CREMA_FIXTURES", default_value = "./fixtures", global = true)]
    fixtures: PathBuf,

    /// Catalog fixture set name
    #[arg(long, env = "CREMA_CATALOG", default_value = "cafe", global = true)]
    catalog: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Load configuration from `.env`, the environment and arguments.
    fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the menu
    Menu(MenuArgs),

    /// List categories with their product counts
    Categories,

    /// Show daily deals, popular picks and available coupons
    Deals,

    /// Add a product to the cart
    Add(AddArgs),

    /// Show the cart and its totals
    Cart,

    /// Set the quantity of a cart line; zero or less removes it
    #[command(allow_negative_numbers = true)]
    Quantity {
        /// Line number, as shown by `cart`
        line: usize,

        /// New quantity
        quantity: i64,
    },

    /// Remove a cart line
    Remove {
        /// Line number, as shown by `cart`
        line: usize,
    },

    /// Empty the cart and drop the coupon
    Clear,

    /// Apply or remove a coupon
    Coupon(CouponCommand),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// List past orders, newest first
    Orders,

    /// Show one order
    Order {
        /// Order number, e.g. ORD-20260101-1234
        number: String,
    },

    /// Add the lines of a past order to the cart at today's prices
    Reorder {
        /// Order number, e.g. ORD-20260101-1234
        number: String,
    },
}

#[derive(Debug, Args)]
struct MenuArgs {
    /// Only show this category
    #[arg(long)]
    category: Option<String>,

    /// Search names, descriptions and categories
    #[arg(long, default_value = "")]
    search: String,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortOrder::Default)]
    sort: SortOrder,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id, as shown by `menu`
    product: u32,

    /// Number of units
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    quantity: u32,

    /// Size; defaults to the product's standard size
    #[arg(long)]
    size: Option<String>,

    /// Milk; defaults to the product's standard milk
    #[arg(long)]
    milk: Option<String>,

    /// Extra, may be repeated
    #[arg(long = "extra")]
    extras: Vec<String>,

    /// Note for the barista
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Debug, Args)]
struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    /// Apply a coupon code
    Apply {
        /// Coupon code, any case
        code: String,
    },

    /// Remove the applied coupon
    Remove,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Payment {
    Cash,
    Card,
    CardOnDelivery,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Customer name
    #[arg(long)]
    name: String,

    /// Customer email
    #[arg(long)]
    email: String,

    /// Customer phone
    #[arg(long)]
    phone: String,

    /// Street address
    #[arg(long)]
    address: String,

    /// District
    #[arg(long)]
    district: String,

    /// City
    #[arg(long)]
    city: String,

    /// Directions for the courier
    #[arg(long)]
    directions: Option<String>,

    /// Payment method
    #[arg(long, value_enum, default_value_t = Payment::Cash)]
    payment: Payment,

    /// Name on the card, for card payments
    #[arg(long, required_if_eq("payment", "card"))]
    card_holder: Option<String>,

    /// Last four digits of the card, for card payments
    #[arg(long, required_if_eq("payment", "card"))]
    card_last_four: Option<String>,

    /// Note for the whole order
    #[arg(long)]
    note: Option<String>,
}

impl CheckoutArgs {
    fn into_details(self) -> Result<CheckoutDetails> {
        let payment = match self.payment {
            Payment::Cash => PaymentMethod::CashOnDelivery,
            Payment::CardOnDelivery => PaymentMethod::CardOnDelivery,
            Payment::Card => {
                let holder = self.card_holder.context("--card-holder is required")?;
                let last_four = self.card_last_four.context("--card-last-four is required")?;

                if last_four.len() != 4 || !last_four.chars().all(|c| c.is_ascii_digit()) {
                    bail!("--card-last-four must be exactly four digits");
                }

                PaymentMethod::Card { holder, last_four }
            }
        };

        Ok(CheckoutDetails {
            customer: Customer {
                name: self.name,
                email: self.email,
                phone: self.phone,
            },
            address: DeliveryAddress {
                address: self.address,
                district: self.district,
                city: self.city,
                directions: self.directions,
            },
            payment,
            note: self.note,
        })
    }
}

/// Crema CLI entry point
pub fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => {
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error:#}");

            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let catalog = Fixture::with_base_path(&cli.fixtures)
        .with_set(&cli.catalog)
        .and_then(|fixture| fixture.catalog())
        .with_context(|| format!("failed to load catalog `{}`", cli.catalog))?;

    let storage = FileStorage::open(&cli.state_dir).with_context(|| {
        format!("failed to open state directory {}", cli.state_dir.display())
    })?;

    let mut store = Store::open(storage, catalog.currency());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Menu(args) => write_menu_query(&mut out, &catalog, args)?,
        Commands::Categories => {
            for (category, count) in catalog.category_counts() {
                writeln!(out, " {category}  \x1b[90m({count})\x1b[0m")?;
            }
        }
        Commands::Deals => write_deals(&mut out, &catalog)?,
        Commands::Add(args) => add(&mut out, &mut store, &catalog, &args)?,
        Commands::Cart => write_cart(&mut out, &store)?,
        Commands::Quantity { line, quantity } => {
            let key = line_key(&store, line)?;
            store.update_quantity(&key, quantity);

            write_cart(&mut out, &store)?;
        }
        Commands::Remove { line } => {
            let key = line_key(&store, line)?;
            store.remove_item(&key);

            write_cart(&mut out, &store)?;
        }
        Commands::Clear => {
            store.clear();

            writeln!(out, "Cart cleared.")?;
        }
        Commands::Coupon(CouponCommand {
            command: CouponSubcommand::Apply { code },
        }) => {
            let coupon = store.apply_coupon(&code, &catalog)?;

            writeln!(out, "Coupon {} applied.", coupon.code)?;
            write_cart(&mut out, &store)?;
        }
        Commands::Coupon(CouponCommand {
            command: CouponSubcommand::Remove,
        }) => {
            store.remove_coupon();

            writeln!(out, "Coupon removed.")?;
        }
        Commands::Checkout(args) => {
            let order = store.create_order(args.into_details()?)?;

            writeln!(out, "Order {} placed, thank you!", order.number)?;
            Receipt::for_order(order, catalog.currency()).write_to(&mut out)?;
        }
        Commands::Orders => write_orders(&mut out, &store, &catalog)?,
        Commands::Order { number } => {
            let number = OrderNumber::from(number.as_str());
            let order = store
                .order(&number)
                .ok_or_else(|| StoreError::OrderNotFound(number.clone()))?;

            write_order(&mut out, order, &catalog)?;
        }
        Commands::Reorder { number } => {
            let number = OrderNumber::from(number.as_str());
            let added = store.reorder(&number, &catalog)?;

            writeln!(out, "Added {added} line(s) from {number}.")?;
            write_cart(&mut out, &store)?;
        }
    }

    Ok(())
}

fn write_menu_query(out: &mut impl Write, catalog: &Catalog, args: MenuArgs) -> Result<()> {
    let query = MenuQuery {
        category: args.category,
        search: args.search,
        sort: args.sort,
    };

    let products = catalog.query(&query);

    if products.is_empty() {
        writeln!(out, "No products match.")?;
    } else {
        write_menu(out, &products, catalog.currency())?;
    }

    Ok(())
}

fn write_deals(out: &mut impl Write, catalog: &Catalog) -> Result<()> {
    writeln!(out, "\n \x1b[1mDaily deals\x1b[0m")?;
    write_menu(&mut *out, &catalog.daily_deals(DAILY_DEALS), catalog.currency())?;

    writeln!(out, "\n \x1b[1mPopular\x1b[0m")?;
    write_menu(&mut *out, &catalog.popular(POPULAR_PICKS), catalog.currency())?;

    writeln!(out, "\n \x1b[1mCoupons\x1b[0m")?;
    write_coupons(
        out,
        catalog.coupons().iter().filter(|coupon| coupon.is_active),
        catalog.currency(),
    )?;

    Ok(())
}

fn write_orders(out: &mut impl Write, store: &Store<FileStorage>, catalog: &Catalog) -> Result<()> {
    if store.orders().is_empty() {
        writeln!(out, "No orders yet.")?;
    }

    for order in store.orders() {
        writeln!(
            out,
            " {}  {}  {:<10}  {:>3} items  {}",
            order.number,
            order.placed_at.strftime("%Y-%m-%d %H:%M"),
            order.status.to_string(),
            order.item_count,
            order.totals.total.to_money(catalog.currency()),
        )?;
    }

    Ok(())
}

fn add(
    out: &mut impl Write,
    store: &mut Store<FileStorage>,
    catalog: &Catalog,
    args: &AddArgs,
) -> Result<()> {
    let product = catalog
        .product(ProductId(args.product))
        .with_context(|| format!("no product with id {}", args.product))?;

    let mut config = Configuration::defaults(product);

    if let Some(name) = args.size.as_deref() {
        let size = product
            .size(name)
            .with_context(|| unknown_option("size", name, &product.sizes))?;

        config = config.with_size(size);
    }

    if let Some(name) = args.milk.as_deref() {
        let milk = product
            .milk(name)
            .with_context(|| unknown_option("milk", name, &product.milk_options))?;

        config = config.with_milk(milk);
    }

    for name in &args.extras {
        let extra = product
            .extra(name)
            .with_context(|| unknown_option("extra", name, &product.extras))?;

        config = config.with_extra(extra);
    }

    let key = store.add_item(product, args.quantity, &config, &args.note)?;
    let position = store
        .lines()
        .iter()
        .position(|line| line.key == key)
        .map_or(0, |idx| idx + 1);

    writeln!(
        out,
        "Added {} × {} (line #{position}).",
        args.quantity, product.name
    )?;

    Ok(())
}

fn unknown_option(kind: &str, name: &str, options: &[ProductOption]) -> String {
    if options.is_empty() {
        return format!("this product has no {kind} options");
    }

    let names: Vec<&str> = options.iter().map(|option| option.name.as_str()).collect();

    format!("unknown {kind} `{name}`, choose one of: {}", names.join(", "))
}

fn line_key(store: &Store<FileStorage>, line: usize) -> Result<LineKey> {
    line.checked_sub(1)
        .and_then(|idx| store.lines().get(idx))
        .map(|line| line.key.clone())
        .with_context(|| format!("no cart line #{line}"))
}

fn write_cart(out: &mut impl Write, store: &Store<FileStorage>) -> Result<()> {
    if store.is_empty() {
        writeln!(out, "Your cart is empty.")?;

        return Ok(());
    }

    let totals = store.totals()?;

    Receipt::for_cart(store.lines(), &totals, store.applied_coupon()).write_to(out)?;

    Ok(())
}

fn write_order(out: &mut impl Write, order: &Order, catalog: &Catalog) -> Result<()> {
    let details = &order.details;

    writeln!(out, " \x1b[1m{}\x1b[0m  {}", order.number, order.status)?;
    writeln!(
        out,
        " Placed {}",
        order.placed_at.strftime("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(
        out,
        " {} <{}> {}",
        details.customer.name, details.customer.email, details.customer.phone
    )?;
    writeln!(
        out,
        " {}, {}, {}",
        details.address.address, details.address.district, details.address.city
    )?;

    let payment = match &details.payment {
        PaymentMethod::Card { holder, last_four } => format!("card ({holder}, •••• {last_four})"),
        PaymentMethod::CashOnDelivery => "cash on delivery".to_string(),
        PaymentMethod::CardOnDelivery => "card on delivery".to_string(),
    };

    writeln!(out, " Payment: {payment}")?;

    if let Some(note) = &details.note {
        writeln!(out, " Note: {note}")?;
    }

    Receipt::for_order(order, catalog.currency()).write_to(out)?;

    Ok(())
}
