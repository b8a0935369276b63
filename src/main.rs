//! Storefront maintenance CLI
//!
//! `storefront validate <file>` — dry-run validation of a products file.
//! `storefront stats`           — load the stores and print counts.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::domain::OrderStatus;
use storefront_core::{admin, Config, OrderLedger, ProductStore};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("validate") => {
            let path = args.next().context("usage: storefront validate <file>")?;
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {path}"))?;
            let violations = admin::validate_products_csv(&content);
            if violations.is_empty() {
                println!("{path}: OK");
                Ok(())
            } else {
                for violation in &violations {
                    println!("{path}: {violation}");
                }
                bail!("{} violation(s) found", violations.len());
            }
        }
        Some("stats") => {
            let config = Config::from_env();
            let products = ProductStore::open(&config.products_path)?;
            let orders = OrderLedger::open(&config.orders_path)?;
            println!(
                "products: {} total, {} active, {} categories",
                products.count(),
                products.active_count(),
                products.categories().len()
            );
            println!(
                "orders: {} total, {} new",
                orders.count()?,
                orders.count_by_status(OrderStatus::New)?
            );
            Ok(())
        }
        _ => bail!("usage: storefront <validate <file> | stats>"),
    }
}
