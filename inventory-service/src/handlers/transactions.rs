use crate::domain::guard_unit_transition;
use crate::dtos::transactions::{
    CompleteTransactionRequest, CreateTransactionRequest, TransactionListParams,
    TransactionListResponse, TransactionResponse,
};
use crate::middleware::UserId;
use crate::models::{Transaction, TransactionLine, TransactionStatus, UnitStatus};
use crate::services::{channel, metrics, MongoDb};
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
use rust_decimal::Decimal;
use serde_json::json;
use service_core::error::AppError;
use std::collections::HashSet;
use validator::Validate;

pub async fn create_transaction(
    State(state): State<AppState>,
    user_id: UserId,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let mut lines = Vec::with_capacity(req.products.len());
    for line_req in &req.products {
        let product = state
            .db
            .products()
            .find_one(doc! { "_id": &line_req.product_id }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Product {} not found", line_req.product_id))
            })?;

        let mut seen = HashSet::new();
        for serial in &line_req.serial_numbers {
            if !seen.insert(serial.as_str()) {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Serial {} listed twice",
                    serial
                )));
            }
            let unit = product.unit(serial).ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Unit {} not found on product {}",
                    serial,
                    product.id
                ))
            })?;
            if unit.status != UnitStatus::InStock {
                return Err(AppError::UnprocessableEntity(anyhow::anyhow!(
                    "Unit {} is not available (status {})",
                    serial,
                    unit.status
                )));
            }
        }

        lines.push(TransactionLine {
            product_id: product.id.clone(),
            quantity: line_req.serial_numbers.len() as i64,
            serial_numbers: line_req.serial_numbers.clone(),
            // Selling price snapshot; later price edits don't touch this sale
            unit_price: product.selling_price,
        });
    }

    let transaction = Transaction::new(
        lines,
        req.discount.unwrap_or(Decimal::ZERO),
        req.customer_id,
        user_id.0,
        req.reference_number,
        None,
    );

    state
        .db
        .transactions()
        .insert_one(&transaction, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert transaction {}: {}", transaction.id, e);
            AppError::from(e)
        })?;

    tracing::info!(
        transaction_id = %transaction.transaction_id,
        total_price = %transaction.total_price,
        vat = %transaction.vat,
        "Transaction reserved"
    );

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::from(transaction)),
    ))
}

/// Best-effort reversal of unit sales after a partial failure. Bypasses the
/// lifecycle guard: this undoes a step of the current operation, it is not
/// a business transition.
async fn rollback_sold_units(db: &MongoDb, applied: &[(String, String)]) {
    for (product_id, serial) in applied {
        if let Err(e) = db
            .cas_unit_status(product_id, serial, UnitStatus::Sold, UnitStatus::InStock)
            .await
        {
            tracing::error!(
                product_id = %product_id,
                serial = %serial,
                "Failed to roll back unit sale: {}",
                e
            );
        }
    }
}

pub async fn complete_transaction(
    State(state): State<AppState>,
    user_id: UserId,
    Path(transaction_id): Path<String>,
    Json(req): Json<CompleteTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let transaction = state
        .db
        .transactions()
        .find_one(doc! { "_id": &transaction_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    if transaction.status != TransactionStatus::Reserved {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Transaction is {}, only Reserved transactions can be completed",
            transaction.status
        )));
    }

    // Units first; the transaction flip below is the commit point.
    let mut applied: Vec<(String, String)> = Vec::new();
    for line in &transaction.products {
        let product = state
            .db
            .products()
            .find_one(doc! { "_id": &line.product_id }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Product {} not found", line.product_id))
            })?;

        for serial in &line.serial_numbers {
            let unit = product.unit(serial).ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Unit {} not found on product {}",
                    serial,
                    product.id
                ))
            })?;

            let result = guard_unit_transition(serial, unit.status, UnitStatus::Sold)
                .map_err(AppError::from);
            let result = match result {
                Ok(()) => {
                    state
                        .db
                        .cas_unit_status(
                            &line.product_id,
                            serial,
                            UnitStatus::InStock,
                            UnitStatus::Sold,
                        )
                        .await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                rollback_sold_units(&state.db, &applied).await;
                if matches!(e, AppError::Conflict(_)) {
                    ::metrics::counter!(metrics::STALE_CONFLICTS).increment(1);
                }
                return Err(e);
            }
            applied.push((line.product_id.clone(), serial.clone()));
        }
    }

    let set = doc! {
        "status": TransactionStatus::Completed.as_str(),
        "payment_status": "paid",
        "payment_method": &req.payment_method,
        "total_amount_paid": req.total_amount_paid.to_string(),
    };
    if let Err(e) = state
        .db
        .cas_transaction(&transaction_id, TransactionStatus::Reserved, set)
        .await
    {
        rollback_sold_units(&state.db, &applied).await;
        if matches!(e, AppError::Conflict(_)) {
            ::metrics::counter!(metrics::STALE_CONFLICTS).increment(1);
        }
        return Err(e);
    }

    ::metrics::counter!(metrics::UNITS_SOLD).increment(applied.len() as u64);

    tracing::info!(
        transaction_id = %transaction.transaction_id,
        units = applied.len(),
        cashier = %user_id.0,
        "Transaction completed"
    );

    state
        .events
        .publish(
            channel::TRANSACTION_COMPLETED,
            json!({ "transaction_id": transaction_id, "action": "completed" }),
        )
        .await;
    for line in &transaction.products {
        state
            .events
            .publish(
                channel::PRODUCT_UPDATED,
                json!({ "product_id": line.product_id, "action": "units-sold" }),
            )
            .await;
    }

    let transaction = state
        .db
        .transactions()
        .find_one(doc! { "_id": &transaction_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    Ok(Json(TransactionResponse::from(transaction)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let mut filter = doc! {};
    if let Some(status) = params.status {
        filter.insert("status", status.as_str());
    }

    let total = state
        .db
        .transactions()
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
        .transactions()
        .find(filter, find_options)
        .await
        .map_err(AppError::from)?;

    let mut transactions = Vec::new();
    while let Some(txn) = cursor.try_next().await.map_err(AppError::from)? {
        transactions.push(TransactionResponse::from(txn));
    }

    let total_pages = (total as f64 / page_size as f64).ceil() as u64;

    Ok(Json(TransactionListResponse {
        transactions,
        total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .db
        .transactions()
        .find_one(doc! { "_id": &transaction_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    Ok(Json(TransactionResponse::from(transaction)))
}
