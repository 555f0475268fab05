//! Catalog domain module.
//!
//! Products and the rules for creating and editing them, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product, ProductPatch};
