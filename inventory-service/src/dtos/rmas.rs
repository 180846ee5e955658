use crate::models::{RmaRequest, RmaStatus, WarrantyStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRmaRequest {
    #[validate(length(min = 1))]
    pub transaction_id: String,
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub serial_number: String,
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(length(min = 1))]
    pub reason: String,
    pub warranty_status: WarrantyStatus,
}

/// Partial update; each field is applied (and audited) independently.
#[derive(Debug, Deserialize)]
pub struct UpdateRmaStatusRequest {
    pub status: Option<RmaStatus>,
    pub process: Option<String>,
    pub notes: Option<String>,
    /// Serial of the replacement unit; required when completing with a
    /// "Replace" resolution.
    pub replacement_serial_number: Option<String>,
    pub replacement_serial_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RmaListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<RmaStatus>,
}

#[derive(Debug, Serialize)]
pub struct RmaResponse {
    pub id: String,
    pub rma_id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub serial_number: String,
    pub customer_name: String,
    pub reason: String,
    pub status: RmaStatus,
    pub process: Option<String>,
    pub notes: Option<String>,
    pub warranty_status: WarrantyStatus,
    pub date_initiated: String,
    pub updated_at: String,
}

impl From<RmaRequest> for RmaResponse {
    fn from(rma: RmaRequest) -> Self {
        Self {
            id: rma.id,
            rma_id: rma.rma_id,
            transaction_id: rma.transaction_id,
            product_id: rma.product_id,
            serial_number: rma.serial_number,
            customer_name: rma.customer_name,
            reason: rma.reason,
            status: rma.status,
            process: rma.process,
            notes: rma.notes,
            warranty_status: rma.warranty_status,
            date_initiated: rma.date_initiated.to_rfc3339(),
            updated_at: rma.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RmaListResponse {
    pub rmas: Vec<RmaResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
