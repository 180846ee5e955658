use crate::models::{RmaStatus, UnitStatus};
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("invalid unit transition for serial {serial}: {from} -> {to}")]
    InvalidUnitTransition {
        serial: String,
        from: UnitStatus,
        to: UnitStatus,
    },

    #[error("invalid RMA transition: {from} -> {to}")]
    InvalidRmaTransition { from: RmaStatus, to: RmaStatus },

    #[error("RMA {rma_id} cannot be approved: warranty is expired")]
    WarrantyExpired { rma_id: String },

    #[error("stale {entity} state for {id}: expected status no longer matches")]
    StaleEntityState { entity: &'static str, id: String },
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::StaleEntityState { .. } => AppError::Conflict(anyhow::anyhow!(err)),
            DomainError::InvalidUnitTransition { .. }
            | DomainError::InvalidRmaTransition { .. }
            | DomainError::WarrantyExpired { .. } => {
                AppError::UnprocessableEntity(anyhow::anyhow!(err))
            }
        }
    }
}
