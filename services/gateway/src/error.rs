use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use order_pipeline::PipelineError;
use serde_json::json;
use thiserror::Error;

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    EngineFailed { message: String, details: String },

    #[error("Failed to read execution report: {0}")]
    ReportUnreadable(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(_) => AppError::BadRequest(err.to_string()),
            PipelineError::EngineExecutionFailed { ref stderr, .. } => AppError::EngineFailed {
                details: stderr.clone(),
                message: err.to_string(),
            },
            PipelineError::ReportUnreadable(inner) => AppError::ReportUnreadable(inner.to_string()),
            PipelineError::Internal(msg) => AppError::InternalError(anyhow::anyhow!(msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::EngineFailed { message, details } => {
                tracing::error!(details = details.as_str(), "{}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    "ENGINE_EXECUTION_FAILED",
                    message,
                    Some(details),
                )
            }
            AppError::ReportUnreadable(msg) => {
                tracing::error!("Execution report unreadable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_UNREADABLE",
                    format!("Failed to read execution report: {}", msg),
                    None,
                )
            }
            AppError::InternalError(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    Some(err.to_string()),
                )
            }
        };

        let mut body = json!({
            "success": false,
            "error": code,
            "message": message,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (status, body) =
            render(PipelineError::InvalidInput("no orders submitted".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_INPUT");
        assert_eq!(body["message"], "Invalid orders data: no orders submitted");
    }

    #[tokio::test]
    async fn test_engine_failure_carries_stderr() {
        let err = PipelineError::EngineExecutionFailed {
            reason: "engine exited with status 1".into(),
            exit_code: Some(1),
            stderr: "Error opening input file\n".into(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "ENGINE_EXECUTION_FAILED");
        assert_eq!(body["details"], "Error opening input file\n");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_internal_error_is_500() {
        let (status, body) = render(PipelineError::Internal("disk full".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["details"], "disk full");
    }
}
