use crate::dtos::customers::{
    CreateCustomerRequest, CustomerListParams, CustomerListResponse, CustomerResponse,
};
use crate::middleware::UserId;
use crate::models::Customer;
use crate::services::channel;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde_json::json;
use service_core::error::AppError;
use validator::Validate;

pub async fn create_customer(
    State(state): State<AppState>,
    user_id: UserId,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let customer = Customer::new(req.name, req.email, req.phone, req.address);

    state
        .db
        .customers()
        .insert_one(&customer, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert customer {}: {}", customer.id, e);
            AppError::from(e)
        })?;

    tracing::info!(
        customer_id = %customer.id,
        user = %user_id.0,
        "Customer registered"
    );

    state
        .events
        .publish(
            channel::CUSTOMER_REGISTERED,
            json!({ "customer_id": customer.id, "action": "registered" }),
        )
        .await;

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let total = state
        .db
        .customers()
        .count_documents(doc! {}, None)
        .await
        .map_err(AppError::from)?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .skip((page - 1) * page_size)
        .limit(page_size as i64)
        .build();

    let mut cursor = state
        .db
        .customers()
        .find(doc! {}, find_options)
        .await
        .map_err(AppError::from)?;

    let mut customers = Vec::new();
    while let Some(customer) = cursor.try_next().await.map_err(AppError::from)? {
        customers.push(CustomerResponse::from(customer));
    }

    let total_pages = (total as f64 / page_size as f64).ceil() as u64;

    Ok(Json(CustomerListResponse {
        customers,
        total,
        page,
        page_size,
        total_pages,
    }))
}
