use crate::error::AppError;
use crate::models::{ExecutionReportResponse, OrderBookResponse};
use crate::state::AppState;
use axum::{extract::State, Json};

pub async fn get_execution_report(
    State(state): State<AppState>,
) -> Result<Json<ExecutionReportResponse>, AppError> {
    let execution_report = state.pipeline.current_report().await?;
    Ok(Json(ExecutionReportResponse {
        success: true,
        execution_report,
    }))
}

pub async fn get_order_book(
    State(state): State<AppState>,
) -> Result<Json<OrderBookResponse>, AppError> {
    let order_book = state.pipeline.current_order_book().await?;
    Ok(Json(OrderBookResponse {
        success: true,
        order_book,
    }))
}
