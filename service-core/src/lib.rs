//! service-core: Shared infrastructure for the inventory platform services.
pub mod config;
pub mod error;
pub mod observability;
