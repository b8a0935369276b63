//! Storefront Core
//!
//! CSV-backed data engine behind a small storefront.
//!
//! ## Features
//! - Product catalog cache with explicit invalidate-and-reload
//! - Catalog filtering, search and pagination
//! - Durable order ledger with safe id assignment and atomic rewrites
//! - Admin product upload: dry-run validation, backup, atomic swap
//! - Order-created notification formatting

pub mod admin;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod domain;
pub mod notify;
pub mod store;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("malformed record: {0}")]
    Parse(String),

    #[error("product file rejected with {} violation(s)", .0.len())]
    Validation(Vec<String>),

    #[error("order ledger write failed: {0}")]
    LedgerWrite(#[source] std::io::Error),

    #[error("order {0} not found")]
    OrderNotFound(u64),

    #[error("backing file unavailable: {0}")]
    StoreUnavailable(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

pub use catalog::{query, CatalogFilter, Paginated, SortKey};
pub use config::Config;
pub use domain::{
    Cart, CustomerInfo, LineItem, Order, OrderStatus, PricedLine, Product, StockIssue,
};
pub use notify::{LogNotifier, OrderNotifier};
pub use store::{OrderLedger, ProductStore};
