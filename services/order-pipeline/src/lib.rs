//! Order Submission & Execution Report Pipeline
//!
//! Drives the external flower-exchange matching engine through its CSV
//! contract: orders are encoded into the batch file, the engine runs once,
//! and its execution report is decoded and projected into a two-sided book.
//!
//! **Flow per submission:**
//! encode → invoke → decode → project, then the batch file is removed.
//!
//! **Key Invariants:**
//! - At most one engine process runs against the batch/report pair at a time
//! - Read-only report fetches never observe a half-finished submission
//! - A report with any malformed row is rejected whole, never truncated
//! - Buy-side membership is exact; every other side lands on the sell side

pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod projection;
pub mod report;

pub use config::PipelineConfig;
pub use engine::{EngineJob, EngineOutput, EngineRunner, ProcessEngine};
pub use error::{FailureKind, PipelineError};
pub use pipeline::{OrderPipeline, Stage, SubmissionOutcome};
pub use projection::{OrderBookProjection, OrderBookStats};
