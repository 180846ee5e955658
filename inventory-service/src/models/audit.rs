use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a state-changing action.
///
/// `previous_value` / `updated_value` hold only the fields that actually
/// changed, keyed by field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub module: String,
    pub event: String,
    pub previous_value: Document,
    pub updated_value: Document,
}

impl AuditLog {
    pub fn new(
        user: String,
        action: String,
        module: String,
        event: String,
        previous_value: Document,
        updated_value: Document,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user,
            action,
            module,
            event,
            previous_value,
            updated_value,
        }
    }
}
