pub mod audit;
pub mod customer;
pub mod product;
pub mod refund;
pub mod rma;
pub mod transaction;

pub use audit::AuditLog;
pub use customer::Customer;
pub use product::{Product, Unit, UnitStatus};
pub use refund::{Refund, RefundLine};
pub use rma::{RmaRequest, RmaStatus, WarrantyStatus};
pub use transaction::{PaymentStatus, Transaction, TransactionLine, TransactionStatus};
