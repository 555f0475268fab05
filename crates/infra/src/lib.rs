//! Infrastructure layer: persistence, service orchestration, config, delivery.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mailer;
pub mod order_workflow;
pub mod store;


pub use config::{AppConfig, StockMode};
pub use error::ServiceError;
