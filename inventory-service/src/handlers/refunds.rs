use crate::domain::guard_unit_transition;
use crate::dtos::refunds::{CreateRefundRequest, RefundResponse};
use crate::middleware::UserId;
use crate::models::{Refund, RefundLine, TransactionStatus, UnitStatus};
use crate::services::{channel, metrics, MongoDb};
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mongodb::bson::doc;
use serde_json::json;
use service_core::error::AppError;
use validator::Validate;

async fn rollback_refunded_units(db: &MongoDb, applied: &[(String, String)]) {
    for (product_id, serial) in applied {
        if let Err(e) = db
            .cas_unit_status(product_id, serial, UnitStatus::Refund, UnitStatus::Sold)
            .await
        {
            tracing::error!(
                product_id = %product_id,
                serial = %serial,
                "Failed to roll back unit refund: {}",
                e
            );
        }
    }
}

pub async fn create_refund(
    State(state): State<AppState>,
    user_id: UserId,
    Json(req): Json<CreateRefundRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let transaction = state
        .db
        .transactions()
        .find_one(doc! { "_id": &req.transaction_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    if transaction.status != TransactionStatus::Completed {
        return Err(AppError::UnprocessableEntity(anyhow::anyhow!(
            "Transaction is {}, only Completed transactions can be refunded",
            transaction.status
        )));
    }

    // Every refunded serial must belong to the transaction being refunded.
    for line_req in &req.products {
        let line = transaction.line(&line_req.product_id).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Product {} is not part of transaction {}",
                line_req.product_id,
                transaction.transaction_id
            ))
        })?;
        for serial in &line_req.serial_numbers {
            if !line.serial_numbers.contains(serial) {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Serial {} is not part of transaction {}",
                    serial,
                    transaction.transaction_id
                )));
            }
        }
    }

    let mut applied: Vec<(String, String)> = Vec::new();
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

        for serial in &line_req.serial_numbers {
            let unit = product.unit(serial).ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Unit {} not found on product {}",
                    serial,
                    product.id
                ))
            })?;

            let result = guard_unit_transition(serial, unit.status, UnitStatus::Refund)
                .map_err(AppError::from);
            let result = match result {
                Ok(()) => {
                    state
                        .db
                        .cas_unit_status(
                            &line_req.product_id,
                            serial,
                            UnitStatus::Sold,
                            UnitStatus::Refund,
                        )
                        .await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                rollback_refunded_units(&state.db, &applied).await;
                return Err(e);
            }
            applied.push((line_req.product_id.clone(), serial.clone()));
        }
    }

    if let Err(e) = state
        .db
        .cas_transaction(
            &req.transaction_id,
            TransactionStatus::Completed,
            doc! { "status": TransactionStatus::Refunded.as_str() },
        )
        .await
    {
        rollback_refunded_units(&state.db, &applied).await;
        return Err(e);
    }

    let refunded_products: Vec<RefundLine> = req
        .products
        .iter()
        .map(|l| RefundLine {
            product_id: l.product_id.clone(),
            quantity: l.serial_numbers.len() as i64,
            serial_numbers: l.serial_numbers.clone(),
        })
        .collect();

    let refund = Refund::new(
        req.transaction_id.clone(),
        refunded_products,
        req.refund_reason,
        user_id.0,
    );

    state
        .db
        .refunds()
        .insert_one(&refund, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert refund {}: {}", refund.id, e);
            AppError::from(e)
        })?;

    ::metrics::counter!(metrics::UNITS_REFUNDED).increment(applied.len() as u64);

    tracing::info!(
        refund_id = %refund.id,
        transaction_id = %refund.transaction_id,
        units = applied.len(),
        refunded_by = %refund.refunded_by,
        "Refund created"
    );

    for line in &refund.refunded_products {
        state
            .events
            .publish(
                channel::PRODUCT_UPDATED,
                json!({ "product_id": line.product_id, "action": "units-refunded" }),
            )
            .await;
    }

    Ok((StatusCode::CREATED, Json(RefundResponse::from(refund))))
}
