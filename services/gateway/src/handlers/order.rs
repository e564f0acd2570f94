use crate::error::AppError;
use crate::models::{SubmissionResponse, SubmitOrdersRequest};
use crate::state::AppState;
use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, State},
    Json,
};

pub async fn submit_orders(
    State(state): State<AppState>,
    payload: Result<Json<SubmitOrdersRequest>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid orders data: {}", e.body_text())))?;

    if payload.orders.is_empty() {
        return Err(AppError::BadRequest("Invalid orders data: no orders submitted".into()));
    }

    // Bounds the engine would otherwise reject row by row
    for (n, order) in payload.orders.iter().enumerate() {
        order.validate().map_err(|e| {
            AppError::BadRequest(format!(
                "Invalid orders data: order {} ({}): {}",
                n + 1,
                order.client_order_id,
                e
            ))
        })?;
    }

    tracing::info!(orders = payload.orders.len(), "Submitting orders");
    let outcome = state.pipeline.submit_orders(&payload.orders).await?;

    Ok(Json(SubmissionResponse::new(
        "Orders processed successfully",
        outcome,
    )))
}

pub async fn upload_orders(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmissionResponse>, AppError> {
    let mut contents = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            contents = Some(bytes);
            break;
        }
    }

    let contents = contents.ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;
    tracing::info!(bytes = contents.len(), "Submitting uploaded order file");
    let outcome = state.pipeline.submit_file(&contents).await?;

    Ok(Json(SubmissionResponse::new(
        "File processed successfully",
        outcome,
    )))
}
