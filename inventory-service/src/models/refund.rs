use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundLine {
    pub product_id: String,
    pub quantity: i64,
    pub serial_numbers: Vec<String>,
}

/// Record of a refund against a completed transaction.
///
/// Immutable after insert; there is no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    #[serde(rename = "_id")]
    pub id: String,
    pub transaction_id: String,
    pub refunded_products: Vec<RefundLine>,
    pub refund_reason: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub refund_date: DateTime<Utc>,
    pub refunded_by: String,
}

impl Refund {
    pub fn new(
        transaction_id: String,
        refunded_products: Vec<RefundLine>,
        refund_reason: String,
        refunded_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id,
            refunded_products,
            refund_reason,
            refund_date: Utc::now(),
            refunded_by,
        }
    }
}
