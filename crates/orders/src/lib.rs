//! Orders domain module.
//!
//! Business rules for checkout and the order-status workflow, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). The
//! store-facing orchestration lives in `storefront-infra`.

pub mod error;
pub mod order;
pub mod place;
pub mod reconcile;

pub use error::OrderError;
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, ShippingDetails};
pub use place::{PlaceOrder, RequestedItem, build_order, validate_request};
pub use reconcile::{StockMovement, reconcile};
