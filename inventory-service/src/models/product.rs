use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a single serial-numbered unit.
///
/// Units are never deleted; a status change is the whole lifecycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    InStock,
    Sold,
    Refund,
    Rma,
    Replace,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::InStock => "in_stock",
            UnitStatus::Sold => "sold",
            UnitStatus::Refund => "refund",
            UnitStatus::Rma => "rma",
            UnitStatus::Replace => "replace",
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physically trackable instance of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub serial_number: String,
    pub status: UnitStatus,
    pub serial_number_image: Option<String>,
}

impl Unit {
    pub fn new(serial_number: String, serial_number_image: Option<String>) -> Self {
        Self {
            serial_number,
            status: UnitStatus::InStock,
            serial_number_image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub model: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    /// Thresholds come from legacy admin forms and may be negative or
    /// inverted; the classifier sanitizes them, storage does not.
    pub low_stock_threshold: i64,
    pub near_low_stock_threshold: i64,
    pub supplier_id: Option<String>,
    pub units: Vec<Unit>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        category: String,
        model: String,
        buying_price: Decimal,
        selling_price: Decimal,
        low_stock_threshold: i64,
        near_low_stock_threshold: i64,
        supplier_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            category,
            model,
            buying_price,
            selling_price,
            low_stock_threshold,
            near_low_stock_threshold,
            supplier_id,
            units: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of units currently available for sale.
    pub fn available(&self) -> u64 {
        self.units
            .iter()
            .filter(|u| u.status == UnitStatus::InStock)
            .count() as u64
    }

    pub fn unit(&self, serial_number: &str) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| u.serial_number == serial_number)
    }
}
