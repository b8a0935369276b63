//! Environment-driven configuration

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub products_path: PathBuf,
    pub orders_path: PathBuf,
    pub currency: String,
}

impl Config {
    /// Reads configuration from the environment, falling back to the
    /// conventional `./data` layout.
    pub fn from_env() -> Self {
        Self {
            products_path: env::var("CSV_PRODUCTS_PATH")
                .unwrap_or_else(|_| "./data/products.csv".to_string())
                .into(),
            orders_path: env::var("CSV_ORDERS_PATH")
                .unwrap_or_else(|_| "./data/orders.csv".to_string())
                .into(),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "RUB".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
