//! Product record

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the products file, as loaded into the cache.
///
/// Products are plain data: they are parsed wholesale from the backing file
/// and replaced wholesale on reload, so there is no mutation API here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub title: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub category: String,
    pub volume_ml: String,
    pub color: String,
    pub images: Vec<String>,
    pub stock: u32,
    pub is_active: bool,
    pub description: String,
}

impl Product {
    pub fn main_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn has_discount(&self) -> bool {
        self.old_price.is_some_and(|old| old > self.price)
    }
}
