use crate::domain::{product_stock_status, StockStatus};
use crate::dtos::reports::{StockAlert, StockSummaryResponse};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use service_core::error::AppError;

/// Dashboard stock summary. Every count comes from the one classifier so
/// the dashboard can never disagree with the inventory list.
pub async fn stock_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut cursor = state
        .db
        .products()
        .find(doc! {}, None)
        .await
        .map_err(AppError::from)?;

    let mut total_products = 0u64;
    let (mut high, mut near_low, mut low, mut out_of_stock) = (0u64, 0u64, 0u64, 0u64);
    let mut attention = Vec::new();

    while let Some(product) = cursor.try_next().await.map_err(AppError::from)? {
        total_products += 1;
        let status = product_stock_status(&product);
        match status {
            StockStatus::High => high += 1,
            StockStatus::NearLow => near_low += 1,
            StockStatus::Low => low += 1,
            StockStatus::OutOfStock => out_of_stock += 1,
        }
        if matches!(status, StockStatus::Low | StockStatus::OutOfStock) {
            attention.push(StockAlert {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: product.available(),
                stock_status: status,
            });
        }
    }

    Ok(Json(StockSummaryResponse {
        total_products,
        high,
        near_low,
        low,
        out_of_stock,
        attention,
    }))
}
