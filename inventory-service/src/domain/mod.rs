//! Stock & unit lifecycle engine.
//!
//! The single source of truth for stock-status classification, unit status
//! transitions, and the RMA workflow. Handlers and reports call into this
//! module instead of re-deriving any of it.

pub mod error;
pub mod rma_workflow;
pub mod stock_status;
pub mod unit_lifecycle;

pub use error::DomainError;
pub use rma_workflow::{field_changes, guard_rma_transition, unit_side_effect, UnitSideEffect};
pub use stock_status::{classify, product_stock_status, StockStatus};
pub use unit_lifecycle::guard_unit_transition;
