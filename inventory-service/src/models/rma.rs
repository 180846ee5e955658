use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RmaStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Expired,
}

impl RmaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RmaStatus::Pending => "Pending",
            RmaStatus::Approved => "Approved",
            RmaStatus::Rejected => "Rejected",
            RmaStatus::InProgress => "In Progress",
            RmaStatus::Completed => "Completed",
            RmaStatus::Expired => "Expired",
        }
    }

    /// Terminal states admit no further change, to any field.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RmaStatus::Rejected | RmaStatus::Completed | RmaStatus::Expired
        )
    }
}

impl std::fmt::Display for RmaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarrantyStatus {
    Valid,
    Expired,
}

impl WarrantyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarrantyStatus::Valid => "Valid",
            WarrantyStatus::Expired => "Expired",
        }
    }
}

/// A customer-initiated return/replace/repair request for one sold unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmaRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub rma_id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub serial_number: String,
    pub customer_name: String,
    pub reason: String,
    pub status: RmaStatus,
    /// Resolution taken, free text. "Replace" is recognized by the
    /// completion side effect.
    pub process: Option<String>,
    pub notes: Option<String>,
    pub warranty_status: WarrantyStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date_initiated: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl RmaRequest {
    pub fn new(
        transaction_id: String,
        product_id: String,
        serial_number: String,
        customer_name: String,
        reason: String,
        warranty_status: WarrantyStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            rma_id: format!("RMA-{:08X}", rand::random::<u32>()),
            transaction_id,
            product_id,
            serial_number,
            customer_name,
            reason,
            status: RmaStatus::Pending,
            process: None,
            notes: None,
            warranty_status,
            date_initiated: now,
            updated_at: now,
        }
    }
}
