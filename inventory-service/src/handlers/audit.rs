use crate::dtos::audit::{AuditListParams, AuditListResponse, AuditLogResponse};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use service_core::error::AppError;

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(params): Query<AuditListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let mut filter = doc! {};
    if let Some(module) = params.module {
        filter.insert("module", module);
    }

    let total = state
        .db
        .audit_logs()
        .count_documents(filter.clone(), None)
        .await
        .map_err(AppError::from)?;

    let find_options = FindOptions::builder()
        .sort(doc! { "timestamp": -1 })
        .skip((page - 1) * page_size)
        .limit(page_size as i64)
        .build();

    let mut cursor = state
        .db
        .audit_logs()
        .find(filter, find_options)
        .await
        .map_err(AppError::from)?;

    let mut logs = Vec::new();
    while let Some(entry) = cursor.try_next().await.map_err(AppError::from)? {
        logs.push(AuditLogResponse::from(entry));
    }

    let total_pages = (total as f64 / page_size as f64).ceil() as u64;

    Ok(Json(AuditListResponse {
        logs,
        total,
        page,
        page_size,
        total_pages,
    }))
}
