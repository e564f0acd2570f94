use order_pipeline::{OrderBookProjection, SubmissionOutcome};
use serde::{Deserialize, Serialize};
use types::execution::ExecutionRecord;
use types::ids::BatchId;
use types::order::OrderRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOrdersRequest {
    pub orders: Vec<OrderRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub batch_id: BatchId,
    pub execution_report: Vec<ExecutionRecord>,
    pub engine_output: String,
    pub order_book: OrderBookProjection,
}

impl SubmissionResponse {
    pub fn new(message: &str, outcome: SubmissionOutcome) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            batch_id: outcome.batch_id,
            execution_report: outcome.execution_report,
            engine_output: outcome.engine_output,
            order_book: outcome.order_book,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReportResponse {
    pub success: bool,
    pub execution_report: Vec<ExecutionRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookResponse {
    pub success: bool,
    pub order_book: OrderBookProjection,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}
