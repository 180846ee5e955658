pub mod audit;
pub mod customers;
pub mod health;
pub mod products;
pub mod refunds;
pub mod reports;
pub mod rmas;
pub mod transactions;

pub use health::{health_check, metrics_endpoint, readiness_check};
