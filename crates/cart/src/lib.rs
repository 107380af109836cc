//! Pending-action cart.
//!
//! This crate holds the line items an operator has scanned but not yet
//! submitted, implemented purely as deterministic logic (no IO, no HTTP).

pub mod item;
pub mod store;

pub use item::{CartItem, CatalogItem, parse_quantity};
pub use store::CartStore;
