//! Backing-file stores
pub mod orders;
pub mod products;

pub use orders::OrderLedger;
pub use products::ProductStore;
