//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Product, ProductError, ProductStatus, VariantEdit};
pub use order::{Order, OrderError, OrderStatus, LineItem};
pub use cart::{Cart, CartError, CartItem, StockShortfall};
