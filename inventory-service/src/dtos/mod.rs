pub mod audit;
pub mod customers;
pub mod products;
pub mod refunds;
pub mod reports;
pub mod rmas;
pub mod transactions;
