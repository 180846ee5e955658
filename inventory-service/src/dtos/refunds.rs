use crate::models::{Refund, RefundLine};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefundLineRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub serial_numbers: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRefundRequest {
    #[validate(length(min = 1))]
    pub transaction_id: String,
    #[validate(length(min = 1), nested)]
    pub products: Vec<RefundLineRequest>,
    #[validate(length(min = 1))]
    pub refund_reason: String,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub id: String,
    pub transaction_id: String,
    pub refunded_products: Vec<RefundLine>,
    pub refund_reason: String,
    pub refund_date: String,
    pub refunded_by: String,
}

impl From<Refund> for RefundResponse {
    fn from(refund: Refund) -> Self {
        Self {
            id: refund.id,
            transaction_id: refund.transaction_id,
            refunded_products: refund.refunded_products,
            refund_reason: refund.refund_reason,
            refund_date: refund.refund_date.to_rfc3339(),
            refunded_by: refund.refunded_by,
        }
    }
}
