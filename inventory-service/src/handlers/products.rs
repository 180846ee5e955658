use crate::domain::product_stock_status;
use crate::dtos::products::{
    AddUnitsRequest, CreateProductRequest, ProductListParams, ProductListResponse,
    ProductResponse, UpdateThresholdsRequest,
};
use crate::middleware::UserId;
use crate::models::{Product, Unit};
use crate::services::channel;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde_json::json;
use service_core::error::AppError;
use std::collections::HashSet;
use validator::Validate;

pub async fn create_product(
    State(state): State<AppState>,
    user_id: UserId,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let product = Product::new(
        req.name,
        req.category,
        req.model,
        req.buying_price,
        req.selling_price,
        req.low_stock_threshold,
        req.near_low_stock_threshold,
        req.supplier_id,
    );

    state
        .db
        .products()
        .insert_one(&product, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert product {}: {}", product.id, e);
            AppError::from(e)
        })?;

    tracing::info!(
        product_id = %product.id,
        name = %product.name,
        user = %user_id.0,
        "Product created"
    );

    state
        .events
        .publish(
            channel::PRODUCT_UPDATED,
            json!({ "product_id": product.id, "action": "created" }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let mut filter = doc! {};
    if let Some(category) = params.category {
        filter.insert("category", category);
    }

    // Stock status is derived, not stored, so a status filter has to
    // classify the full candidate set before paginating.
    if let Some(wanted) = params.stock_status {
        let mut cursor = state
            .db
            .products()
            .find(filter, None)
            .await
            .map_err(AppError::from)?;

        let mut matching = Vec::new();
        while let Some(product) = cursor.try_next().await.map_err(AppError::from)? {
            if product_stock_status(&product) == wanted {
                matching.push(product);
            }
        }

        let total = matching.len() as u64;
        let total_pages = (total as f64 / page_size as f64).ceil() as u64;
        let products = matching
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .map(ProductResponse::from)
            .collect();

        return Ok(Json(ProductListResponse {
            products,
            total,
            page,
            page_size,
            total_pages,
        }));
    }

    let total = state
        .db
        .products()
        .count_documents(filter.clone(), None)
        .await
        .map_err(AppError::from)?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .skip((page - 1) * page_size)
        .limit(page_size as i64)
        .build();

    let mut cursor = state
        .db
        .products()
        .find(filter, find_options)
        .await
        .map_err(AppError::from)?;

    let mut products = Vec::new();
    while let Some(product) = cursor.try_next().await.map_err(AppError::from)? {
        products.push(ProductResponse::from(product));
    }

    let total_pages = (total as f64 / page_size as f64).ceil() as u64;

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .products()
        .find_one(doc! { "_id": &product_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from(product)))
}

pub async fn update_thresholds(
    State(state): State<AppState>,
    user_id: UserId,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateThresholdsRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Out-of-range values are stored as-is; the classifier sanitizes and
    // logs them rather than failing the write.
    let result = state
        .db
        .products()
        .update_one(
            doc! { "_id": &product_id },
            doc! {
                "$set": {
                    "low_stock_threshold": req.low_stock_threshold,
                    "near_low_stock_threshold": req.near_low_stock_threshold,
                    "updated_at": mongodb::bson::DateTime::now(),
                }
            },
            None,
        )
        .await
        .map_err(AppError::from)?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
    }

    tracing::info!(
        product_id = %product_id,
        low = req.low_stock_threshold,
        near_low = req.near_low_stock_threshold,
        user = %user_id.0,
        "Stock thresholds updated"
    );

    state
        .events
        .publish(
            channel::PRODUCT_UPDATED,
            json!({ "product_id": product_id, "action": "thresholds-updated" }),
        )
        .await;

    let product = state
        .db
        .products()
        .find_one(doc! { "_id": &product_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from(product)))
}

pub async fn add_units(
    State(state): State<AppState>,
    user_id: UserId,
    Path(product_id): Path<String>,
    Json(req): Json<AddUnitsRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let product = state
        .db
        .products()
        .find_one(doc! { "_id": &product_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    let existing: HashSet<&str> = product
        .units
        .iter()
        .map(|u| u.serial_number.as_str())
        .collect();

    let mut seen = HashSet::new();
    for unit in &req.units {
        if existing.contains(unit.serial_number.as_str())
            || !seen.insert(unit.serial_number.as_str())
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Duplicate serial number {}",
                unit.serial_number
            )));
        }
    }

    let units: Vec<Unit> = req
        .units
        .into_iter()
        .map(|u| Unit::new(u.serial_number, u.serial_number_image))
        .collect();
    let added = units.len();

    state.db.push_units(&product_id, &units).await?;

    tracing::info!(
        product_id = %product_id,
        added = added,
        user = %user_id.0,
        "Units added to product"
    );

    state
        .events
        .publish(
            channel::PRODUCT_UPDATED,
            json!({ "product_id": product_id, "action": "units-added", "count": added }),
        )
        .await;

    let product = state
        .db
        .products()
        .find_one(doc! { "_id": &product_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}
