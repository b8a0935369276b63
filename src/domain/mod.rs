//! Domain types
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, PricedLine, StockIssue};
pub use order::{CustomerInfo, LineItem, Order, OrderStatus};
pub use product::Product;
