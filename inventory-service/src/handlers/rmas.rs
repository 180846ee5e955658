use crate::domain::{
    field_changes, guard_rma_transition, guard_unit_transition, unit_side_effect, UnitSideEffect,
};
use crate::dtos::rmas::{
    CreateRmaRequest, RmaListParams, RmaListResponse, RmaResponse, UpdateRmaStatusRequest,
};
use crate::middleware::UserId;
use crate::models::{AuditLog, RmaRequest, Unit, UnitStatus};
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
use serde_json::json;
use service_core::error::AppError;
use validator::Validate;

pub async fn create_rma(
    State(state): State<AppState>,
    _user_id: UserId,
    Json(req): Json<CreateRmaRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let transaction = state
        .db
        .transactions()
        .find_one(doc! { "_id": &req.transaction_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    let line = transaction.line(&req.product_id).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Product {} is not part of transaction {}",
            req.product_id,
            transaction.transaction_id
        ))
    })?;
    if !line.serial_numbers.contains(&req.serial_number) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Serial {} is not part of transaction {}",
            req.serial_number,
            transaction.transaction_id
        )));
    }

    let rma = RmaRequest::new(
        req.transaction_id,
        req.product_id,
        req.serial_number,
        req.customer_name,
        req.reason,
        req.warranty_status,
    );

    state.db.rmas().insert_one(&rma, None).await.map_err(|e| {
        tracing::error!("Failed to insert RMA {}: {}", rma.rma_id, e);
        AppError::from(e)
    })?;

    tracing::info!(rma_id = %rma.rma_id, serial = %rma.serial_number, "RMA request created");

    Ok((StatusCode::CREATED, Json(RmaResponse::from(rma))))
}

/// Unit moves applied ahead of the RMA status flip, remembered so they can
/// be unwound if the flip loses a race.
enum AppliedUnitMove {
    MovedToRma {
        product_id: String,
        serial: String,
    },
    ReturnedToSold {
        product_id: String,
        serial: String,
    },
    Replaced {
        product_id: String,
        serial: String,
        replacement_serial: String,
    },
}

async fn rollback_unit_move(db: &MongoDb, applied: &AppliedUnitMove) {
    let result = match applied {
        AppliedUnitMove::MovedToRma { product_id, serial } => {
            db.cas_unit_status(product_id, serial, UnitStatus::Rma, UnitStatus::Sold)
                .await
        }
        AppliedUnitMove::ReturnedToSold { product_id, serial } => {
            db.cas_unit_status(product_id, serial, UnitStatus::Sold, UnitStatus::Rma)
                .await
        }
        AppliedUnitMove::Replaced {
            product_id,
            serial,
            replacement_serial,
        } => {
            let pulled = db.pull_unit(product_id, replacement_serial).await;
            let reverted = db
                .cas_unit_status(product_id, serial, UnitStatus::Replace, UnitStatus::Rma)
                .await;
            pulled.and(reverted)
        }
    };
    if let Err(e) = result {
        tracing::error!("Failed to roll back RMA unit move: {}", e);
    }
}

async fn apply_unit_side_effect(
    db: &MongoDb,
    rma: &RmaRequest,
    effect: UnitSideEffect,
    replacement_serial: Option<&str>,
    replacement_image: Option<&str>,
) -> Result<Option<AppliedUnitMove>, AppError> {
    let product = db
        .products()
        .find_one(doc! { "_id": &rma.product_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Product {} not found", rma.product_id))
        })?;

    let unit = product.unit(&rma.serial_number).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!(
            "Unit {} not found on product {}",
            rma.serial_number,
            rma.product_id
        ))
    })?;

    match effect {
        UnitSideEffect::MoveToRma => {
            guard_unit_transition(&rma.serial_number, unit.status, UnitStatus::Rma)?;
            db.cas_unit_status(
                &rma.product_id,
                &rma.serial_number,
                UnitStatus::Sold,
                UnitStatus::Rma,
            )
            .await?;
            Ok(Some(AppliedUnitMove::MovedToRma {
                product_id: rma.product_id.clone(),
                serial: rma.serial_number.clone(),
            }))
        }
        UnitSideEffect::ReturnToSold => {
            // A request resolved without ever being approved never moved the
            // unit off `sold`, so there is nothing to put back.
            if unit.status == UnitStatus::Sold {
                return Ok(None);
            }
            guard_unit_transition(&rma.serial_number, unit.status, UnitStatus::Sold)?;
            db.cas_unit_status(
                &rma.product_id,
                &rma.serial_number,
                UnitStatus::Rma,
                UnitStatus::Sold,
            )
            .await?;
            Ok(Some(AppliedUnitMove::ReturnedToSold {
                product_id: rma.product_id.clone(),
                serial: rma.serial_number.clone(),
            }))
        }
        UnitSideEffect::Replace => {
            let replacement_serial = replacement_serial.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "replacement_serial_number is required for a Replace resolution"
                ))
            })?;
            if product.unit(replacement_serial).is_some() {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Duplicate serial number {}",
                    replacement_serial
                )));
            }

            guard_unit_transition(&rma.serial_number, unit.status, UnitStatus::Replace)?;
            db.cas_unit_status(
                &rma.product_id,
                &rma.serial_number,
                UnitStatus::Rma,
                UnitStatus::Replace,
            )
            .await?;

            // Replacement is provisioned in stock, then sold to the customer.
            let replacement = Unit::new(
                replacement_serial.to_string(),
                replacement_image.map(str::to_string),
            );
            if let Err(e) = db.push_units(&rma.product_id, &[replacement]).await {
                if let Err(revert) = db
                    .cas_unit_status(
                        &rma.product_id,
                        &rma.serial_number,
                        UnitStatus::Replace,
                        UnitStatus::Rma,
                    )
                    .await
                {
                    tracing::error!("Failed to roll back replace move: {}", revert);
                }
                return Err(e);
            }
            if let Err(e) = db
                .cas_unit_status(
                    &rma.product_id,
                    replacement_serial,
                    UnitStatus::InStock,
                    UnitStatus::Sold,
                )
                .await
            {
                rollback_unit_move(
                    db,
                    &AppliedUnitMove::Replaced {
                        product_id: rma.product_id.clone(),
                        serial: rma.serial_number.clone(),
                        replacement_serial: replacement_serial.to_string(),
                    },
                )
                .await;
                return Err(e);
            }

            Ok(Some(AppliedUnitMove::Replaced {
                product_id: rma.product_id.clone(),
                serial: rma.serial_number.clone(),
                replacement_serial: replacement_serial.to_string(),
            }))
        }
    }
}

pub async fn update_rma_status(
    State(state): State<AppState>,
    user_id: UserId,
    Path(rma_id): Path<String>,
    Json(req): Json<UpdateRmaStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.status.is_none() && req.process.is_none() && req.notes.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No fields to update")));
    }

    let rma = state
        .db
        .rmas()
        .find_one(doc! { "_id": &rma_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("RMA not found")))?;

    if let Some(to) = req.status {
        guard_rma_transition(&rma, to)?;
    } else if rma.status.is_terminal() {
        return Err(AppError::UnprocessableEntity(anyhow::anyhow!(
            "RMA {} is {} and can no longer be edited",
            rma.rma_id,
            rma.status
        )));
    }

    // The resolution in effect for completion side effects: the incoming
    // process if given, otherwise whatever was recorded earlier.
    let effective_process = req.process.as_deref().or(rma.process.as_deref());
    let effect = req.status.and_then(|to| unit_side_effect(to, effective_process));

    let (previous, updated) = field_changes(
        &rma,
        req.status,
        req.process.as_deref(),
        req.notes.as_deref(),
    );

    let mut applied_move = None;
    if let Some(effect) = effect {
        applied_move = apply_unit_side_effect(
            &state.db,
            &rma,
            effect,
            req.replacement_serial_number.as_deref(),
            req.replacement_serial_image.as_deref(),
        )
        .await?;
    }

    let mut set = doc! {};
    if let Some(to) = req.status {
        set.insert("status", to.as_str());
    }
    if let Some(process) = &req.process {
        set.insert("process", process);
    }
    if let Some(notes) = &req.notes {
        set.insert("notes", notes);
    }

    if let Err(e) = state.db.cas_rma(&rma_id, rma.status, set).await {
        if let Some(applied) = &applied_move {
            rollback_unit_move(&state.db, applied).await;
        }
        if matches!(e, AppError::Conflict(_)) {
            ::metrics::counter!(metrics::STALE_CONFLICTS).increment(1);
        }
        return Err(e);
    }

    if req.status.is_some() {
        ::metrics::counter!(metrics::RMA_TRANSITIONS).increment(1);
    }

    // One audit entry per applied change, carrying only the changed fields.
    // Audit persistence failure is a warning, it does not undo the update.
    if !updated.is_empty() {
        let entry = AuditLog::new(
            user_id.0.clone(),
            "UPDATE".to_string(),
            "RMA".to_string(),
            format!("RMA {} updated", rma.rma_id),
            previous,
            updated,
        );
        if let Err(e) = state.db.audit_logs().insert_one(&entry, None).await {
            tracing::warn!(rma_id = %rma.rma_id, "Failed to write audit log: {}", e);
        }
    }

    tracing::info!(
        rma_id = %rma.rma_id,
        status = ?req.status,
        user = %user_id.0,
        "RMA updated"
    );

    if applied_move.is_some() {
        state
            .events
            .publish(
                channel::PRODUCT_UPDATED,
                json!({ "product_id": rma.product_id, "action": "rma-unit-moved" }),
            )
            .await;
    }

    let rma = state
        .db
        .rmas()
        .find_one(doc! { "_id": &rma_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("RMA not found")))?;

    Ok(Json(RmaResponse::from(rma)))
}

pub async fn list_rmas(
    State(state): State<AppState>,
    Query(params): Query<RmaListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let mut filter = doc! {};
    if let Some(status) = params.status {
        filter.insert("status", status.as_str());
    }

    let total = state
        .db
        .rmas()
        .count_documents(filter.clone(), None)
        .await
        .map_err(AppError::from)?;

    let find_options = FindOptions::builder()
        .sort(doc! { "date_initiated": -1 })
        .skip((page - 1) * page_size)
        .limit(page_size as i64)
        .build();

    let mut cursor = state
        .db
        .rmas()
        .find(filter, find_options)
        .await
        .map_err(AppError::from)?;

    let mut rmas = Vec::new();
    while let Some(rma) = cursor.try_next().await.map_err(AppError::from)? {
        rmas.push(RmaResponse::from(rma));
    }

    let total_pages = (total as f64 / page_size as f64).ceil() as u64;

    Ok(Json(RmaListResponse {
        rmas,
        total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_rma(
    State(state): State<AppState>,
    Path(rma_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rma = state
        .db
        .rmas()
        .find_one(doc! { "_id": &rma_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("RMA not found")))?;

    Ok(Json(RmaResponse::from(rma)))
}
