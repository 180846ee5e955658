use crate::models::AuditLog;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AuditListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub module: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub module: String,
    pub event: String,
    pub previous_value: serde_json::Value,
    pub updated_value: serde_json::Value,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(entry: AuditLog) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp.to_rfc3339(),
            user: entry.user,
            action: entry.action,
            module: entry.module,
            event: entry.event,
            previous_value: serde_json::to_value(&entry.previous_value)
                .unwrap_or(serde_json::Value::Null),
            updated_value: serde_json::to_value(&entry.updated_value)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub logs: Vec<AuditLogResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
