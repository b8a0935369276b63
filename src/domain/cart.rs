//! Session cart
//!
//! The cart itself is external session state: a SKU -> quantity mapping the
//! web layer keeps per visitor. The core resolves it against the live
//! [`ProductStore`] when asked, at cart-page render and at checkout.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Product;
use crate::store::ProductStore;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    items: IndexMap<String, u32>,
}

/// A cart line resolved against the live catalog, carrying its price.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedLine {
    pub product: Product,
    pub qty: u32,
    pub line_total: Decimal,
}

/// A cart entry the current catalog cannot satisfy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockIssue {
    /// SKU no longer exists in the catalog.
    Missing { sku: String },
    /// Product exists but is not active.
    Inactive { sku: String },
    /// Requested quantity exceeds current stock.
    Insufficient {
        sku: String,
        requested: u32,
        available: u32,
    },
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn qty(&self, sku: &str) -> u32 {
        self.items.get(sku).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(sku, &qty)| (sku.as_str(), qty))
    }

    /// Adds to an existing line's quantity, or starts a new line.
    pub fn add(&mut self, sku: impl Into<String>, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.items.entry(sku.into()).or_insert(0) += qty;
    }

    /// Sets a line's quantity outright; zero removes the line.
    pub fn set_qty(&mut self, sku: &str, qty: u32) {
        if qty == 0 {
            self.items.shift_remove(sku);
        } else if let Some(existing) = self.items.get_mut(sku) {
            *existing = qty;
        } else {
            self.items.insert(sku.to_string(), qty);
        }
    }

    pub fn remove(&mut self, sku: &str) {
        self.items.shift_remove(sku);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Resolves the cart against the live catalog and prices each line.
    ///
    /// SKUs that have vanished from the catalog are dropped, matching the
    /// storefront behavior of silently pruning dead cart entries. Returns
    /// the surviving lines and their grand total.
    pub fn priced_lines(&self, store: &ProductStore) -> (Vec<PricedLine>, Decimal) {
        let mut lines = Vec::new();
        let mut total = Decimal::ZERO;
        for (sku, &qty) in &self.items {
            let Some(product) = store.get(sku) else {
                continue;
            };
            let line_total = product.price * Decimal::from(qty);
            total += line_total;
            lines.push(PricedLine {
                product,
                qty,
                line_total,
            });
        }
        (lines, total)
    }

    /// Checks cart contents against current stock and active flags.
    pub fn stock_issues(&self, store: &ProductStore) -> Vec<StockIssue> {
        let mut issues = Vec::new();
        for (sku, &qty) in &self.items {
            match store.get(sku) {
                None => issues.push(StockIssue::Missing { sku: sku.clone() }),
                Some(product) if !product.is_active => {
                    issues.push(StockIssue::Inactive { sku: sku.clone() });
                }
                Some(product) if qty > product.stock => {
                    issues.push(StockIssue::Insufficient {
                        sku: sku.clone(),
                        requested: qty,
                        available: product.stock,
                    });
                }
                Some(_) => {}
            }
        }
        issues
    }
}
