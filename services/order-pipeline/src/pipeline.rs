//! Pipeline orchestrator
//!
//! One submission is one cycle through
//! `Idle → Encoding → Invoking → Decoding → Projecting → Done`; any stage may
//! end in `Failed`. The batch and report files are fixed, shared paths, so
//! every submission holds the cycle lock exclusively from writing the batch
//! until the report is decoded. Read-only fetches share the lock with each
//! other and never observe a submission in flight.
//!
//! The previous report is set aside while the engine runs. A clean exit
//! discards it, so a submission only ever returns what this run wrote; a
//! failed run puts it back.

use crate::config::PipelineConfig;
use crate::encoder::encode_batch;
use crate::engine::{EngineJob, EngineOutput, EngineRunner, ProcessEngine};
use crate::error::{FailureKind, PipelineError};
use crate::projection::OrderBookProjection;
use crate::report::read_report;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, info_span, warn, Instrument};
use types::execution::ExecutionRecord;
use types::ids::BatchId;
use types::order::OrderRequest;

/// Pipeline cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Encoding,
    Invoking,
    Decoding,
    Projecting,
    Done,
    Failed(FailureKind),
}

impl Stage {
    /// Legal transitions. `Idle → Decoding` is the read-only path.
    pub fn can_advance_to(self, next: Stage) -> bool {
        match (self, next) {
            (Stage::Done | Stage::Failed(_), _) => false,
            (_, Stage::Failed(_)) => true,
            (Stage::Idle, Stage::Encoding)
            | (Stage::Idle, Stage::Decoding)
            | (Stage::Encoding, Stage::Invoking)
            | (Stage::Invoking, Stage::Decoding)
            | (Stage::Decoding, Stage::Projecting)
            | (Stage::Projecting, Stage::Done) => true,
            _ => false,
        }
    }
}

/// Tracks one cycle's stage and logs transitions
#[derive(Debug)]
struct Cycle {
    stage: Stage,
}

impl Cycle {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal pipeline transition {:?} -> {:?}",
            self.stage,
            next
        );
        debug!(from = ?self.stage, to = ?next, "Pipeline stage");
        self.stage = next;
    }

    /// Move to `Failed` when a stage returns an error
    fn track<T>(&mut self, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
        result.map_err(|err| {
            warn!(stage = ?self.stage, "Pipeline cycle failed: {}", err);
            self.advance(Stage::Failed(err.kind()));
            err
        })
    }
}

/// Result of a completed submission cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub batch_id: BatchId,
    pub execution_report: Vec<ExecutionRecord>,
    /// Engine stdout, passed through verbatim
    pub engine_output: String,
    pub order_book: OrderBookProjection,
}

/// Single-flight driver for the external matching engine
pub struct OrderPipeline {
    config: PipelineConfig,
    engine: Arc<dyn EngineRunner>,
    cycle_lock: RwLock<()>,
}

impl OrderPipeline {
    pub fn new(config: PipelineConfig, engine: Arc<dyn EngineRunner>) -> Self {
        Self {
            config,
            engine,
            cycle_lock: RwLock::new(()),
        }
    }

    /// Pipeline driving the configured engine executable
    pub fn from_config(config: PipelineConfig) -> Self {
        let engine = Arc::new(ProcessEngine::from_config(&config));
        Self::new(config, engine)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Encode orders, run the engine once and decode its report
    pub async fn submit_orders(
        &self,
        orders: &[OrderRequest],
    ) -> Result<SubmissionOutcome, PipelineError> {
        let batch_id = BatchId::new();
        let span = info_span!("submit_orders", %batch_id, orders = orders.len());

        async move {
            let mut cycle = Cycle::new();
            cycle.advance(Stage::Encoding);
            let batch = cycle.track(encode_batch(orders))?;
            self.run_cycle(batch_id, &mut cycle, batch.as_bytes()).await
        }
        .instrument(span)
        .await
    }

    /// Use an uploaded CSV verbatim as the order batch
    pub async fn submit_file(&self, contents: &[u8]) -> Result<SubmissionOutcome, PipelineError> {
        let batch_id = BatchId::new();
        let span = info_span!("submit_file", %batch_id, bytes = contents.len());

        async move {
            let mut cycle = Cycle::new();
            cycle.advance(Stage::Encoding);
            if contents.iter().all(u8::is_ascii_whitespace) {
                return cycle.track(Err(PipelineError::InvalidInput(
                    "uploaded file is empty".into(),
                )));
            }
            self.run_cycle(batch_id, &mut cycle, contents).await
        }
        .instrument(span)
        .await
    }

    /// Current execution report; never runs the engine
    pub async fn current_report(&self) -> Result<Vec<ExecutionRecord>, PipelineError> {
        self.fetch_current().await.map(|(records, _)| records)
    }

    /// Projection of the current execution report; never runs the engine
    pub async fn current_order_book(&self) -> Result<OrderBookProjection, PipelineError> {
        self.fetch_current().await.map(|(_, book)| book)
    }

    async fn fetch_current(
        &self,
    ) -> Result<(Vec<ExecutionRecord>, OrderBookProjection), PipelineError> {
        let _shared = self.cycle_lock.read().await;
        let mut cycle = Cycle::new();

        cycle.advance(Stage::Decoding);
        let records = cycle.track(read_report(&self.config.report_path()).await.map_err(Into::into))?;
        cycle.advance(Stage::Projecting);
        let book = OrderBookProjection::project(&records);
        cycle.advance(Stage::Done);

        Ok((records, book))
    }

    /// Critical section: write batch, invoke, decode, project, clean up
    async fn run_cycle(
        &self,
        batch_id: BatchId,
        cycle: &mut Cycle,
        batch: &[u8],
    ) -> Result<SubmissionOutcome, PipelineError> {
        let _exclusive = self.cycle_lock.write().await;
        let job = EngineJob::from_config(&self.config);

        cycle.track(write_batch(&job.batch_path, batch).await)?;
        let previous = cycle.track(stash_report(&job.report_path).await)?;
        cycle.advance(Stage::Invoking);
        let output = match self.invoke(&job).await {
            Ok(output) => {
                discard_stash(previous).await;
                output
            }
            Err(err) => {
                restore_report(&job.report_path, previous).await;
                return cycle.track(Err(err));
            }
        };

        cycle.advance(Stage::Decoding);
        let records = cycle.track(read_report(&job.report_path).await.map_err(Into::into))?;
        cycle.advance(Stage::Projecting);
        let order_book = OrderBookProjection::project(&records);
        cycle.advance(Stage::Done);

        remove_batch(&job.batch_path).await;
        info!(
            records = records.len(),
            buys = order_book.buy_orders.len(),
            sells = order_book.sell_orders.len(),
            "Submission cycle complete"
        );

        Ok(SubmissionOutcome {
            batch_id,
            execution_report: records,
            engine_output: output.stdout,
            order_book,
        })
    }

    async fn invoke(&self, job: &EngineJob) -> Result<EngineOutput, PipelineError> {
        self.engine.run(job).await?.ensure_success()
    }
}

/// Write the batch and sync it to disk before the engine may read it
async fn write_batch(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let io_failed = |e: io::Error| {
        PipelineError::Internal(format!("failed to write order batch {}: {}", path.display(), e))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_failed)?;
    }
    let mut file = tokio::fs::File::create(path).await.map_err(io_failed)?;
    file.write_all(contents).await.map_err(io_failed)?;
    file.sync_all().await.map_err(io_failed)?;

    debug!(path = %path.display(), bytes = contents.len(), "Order batch written");
    Ok(())
}

fn stash_path(report: &Path) -> PathBuf {
    let mut name = report.as_os_str().to_owned();
    name.push(".prev");
    PathBuf::from(name)
}

/// Move the current report out of the engine's way
async fn stash_report(report: &Path) -> Result<Option<PathBuf>, PipelineError> {
    let stash = stash_path(report);
    match tokio::fs::rename(report, &stash).await {
        Ok(()) => Ok(Some(stash)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PipelineError::Internal(format!(
            "failed to set aside execution report {}: {}",
            report.display(),
            e
        ))),
    }
}

/// Put the previous report back after a failed run, replacing any partial output
async fn restore_report(report: &Path, stash: Option<PathBuf>) {
    let Some(stash) = stash else { return };
    match tokio::fs::rename(&stash, report).await {
        Ok(()) => debug!(path = %report.display(), "Previous execution report restored"),
        Err(e) => warn!(path = %report.display(), "Failed to restore execution report: {}", e),
    }
}

async fn discard_stash(stash: Option<PathBuf>) {
    let Some(stash) = stash else { return };
    if let Err(e) = tokio::fs::remove_file(&stash).await {
        warn!(path = %stash.display(), "Failed to remove previous execution report: {}", e);
    }
}

/// Best-effort batch cleanup; a stale batch only affects the next write
async fn remove_batch(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Order batch removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove order batch: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use types::numeric::{Price, Quantity};
    use types::order::{Instrument, Side};

    /// Engine stand-in that fails or writes a fixed report
    struct ScriptedEngine {
        report: Option<&'static str>,
        exit_code: i32,
        runs: AtomicUsize,
    }

    impl ScriptedEngine {
        fn writing(report: &'static str) -> Self {
            Self {
                report: Some(report),
                exit_code: 0,
                runs: AtomicUsize::new(0),
            }
        }

        fn failing(exit_code: i32) -> Self {
            Self {
                report: None,
                exit_code,
                runs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EngineRunner for ScriptedEngine {
        async fn run(&self, job: &EngineJob) -> Result<EngineOutput, PipelineError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            assert!(job.batch_path.exists(), "engine started before batch was written");
            if let Some(report) = self.report {
                std::fs::write(&job.report_path, report).unwrap();
            }
            Ok(EngineOutput {
                exit_code: Some(self.exit_code),
                stdout: "Time taken: 5 microseconds\n".into(),
                stderr: if self.exit_code == 0 { String::new() } else { "Error opening input file\n".into() },
            })
        }
    }

    const REJECTED_ROSE: &str = "Order ID, Client Order ID, Instrument, Side, Execution Status, Quantity, Price, error\nord1,aa13,Rose,1,Rejected,100,55.5,\n";

    fn rose_order() -> OrderRequest {
        OrderRequest::new(
            "aa13",
            Instrument::Rose,
            Side::Buy,
            Quantity::new(100),
            Price::from_str("55.5").unwrap(),
        )
    }

    #[test]
    fn test_stage_transitions() {
        assert!(Stage::Idle.can_advance_to(Stage::Encoding));
        assert!(Stage::Idle.can_advance_to(Stage::Decoding));
        assert!(Stage::Encoding.can_advance_to(Stage::Invoking));
        assert!(Stage::Invoking.can_advance_to(Stage::Failed(FailureKind::EngineExecutionFailed)));
        assert!(!Stage::Encoding.can_advance_to(Stage::Decoding));
        assert!(!Stage::Invoking.can_advance_to(Stage::Projecting));
        assert!(!Stage::Done.can_advance_to(Stage::Idle));
        assert!(!Stage::Failed(FailureKind::Internal).can_advance_to(Stage::Encoding));
    }

    #[test]
    fn test_cycle_records_failure_kind() {
        let mut cycle = Cycle::new();
        cycle.advance(Stage::Encoding);
        let result: Result<(), _> = cycle.track(Err(PipelineError::InvalidInput("empty".into())));
        assert!(result.is_err());
        assert_eq!(cycle.stage, Stage::Failed(FailureKind::InvalidInput));
    }

    #[tokio::test]
    async fn test_rejected_order_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::writing(REJECTED_ROSE));
        let pipeline = OrderPipeline::new(PipelineConfig::rooted_at(dir.path()), engine.clone());

        let outcome = pipeline.submit_orders(&[rose_order()]).await.unwrap();

        assert_eq!(outcome.execution_report.len(), 1);
        let record = &outcome.execution_report[0];
        assert_eq!(record.execution_status.as_wire(), "Rejected");
        assert_eq!(record.instrument, "Rose");
        assert_eq!(outcome.order_book.buy_orders.len(), 1);
        assert!(outcome.order_book.sell_orders.is_empty());
        assert_eq!(outcome.order_book.stats.rejected, 1);
        assert_eq!(outcome.order_book.stats.classified(), 1);
        assert_eq!(outcome.engine_output, "Time taken: 5 microseconds\n");
        assert_eq!(engine.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_removed_and_report_kept_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        let pipeline =
            OrderPipeline::new(config.clone(), Arc::new(ScriptedEngine::writing(REJECTED_ROSE)));

        pipeline.submit_orders(&[rose_order()]).await.unwrap();

        assert!(!config.batch_path().exists());
        assert!(config.report_path().exists());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        let engine = Arc::new(ScriptedEngine::writing(REJECTED_ROSE));
        let pipeline = OrderPipeline::new(config.clone(), engine.clone());

        let err = pipeline.submit_orders(&[]).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert_eq!(engine.runs.load(Ordering::SeqCst), 0);
        assert!(!config.batch_path().exists());
    }

    #[tokio::test]
    async fn test_engine_failure_skips_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        // A report that would fail to decode proves decoding never ran.
        std::fs::write(config.report_path(), "garbage").unwrap();
        let pipeline = OrderPipeline::new(config.clone(), Arc::new(ScriptedEngine::failing(1)));

        let err = pipeline.submit_orders(&[rose_order()]).await.unwrap_err();

        match err {
            PipelineError::EngineExecutionFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "Error opening input file\n");
            }
            other => panic!("expected EngineExecutionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_engine_failure_restores_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        std::fs::write(config.report_path(), REJECTED_ROSE).unwrap();
        let pipeline = OrderPipeline::new(config.clone(), Arc::new(ScriptedEngine::failing(2)));

        pipeline.submit_orders(&[rose_order()]).await.unwrap_err();

        assert_eq!(std::fs::read_to_string(config.report_path()).unwrap(), REJECTED_ROSE);
        assert!(!stash_path(&config.report_path()).exists());
        assert_eq!(pipeline.current_report().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_report_not_returned_when_engine_writes_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        std::fs::write(config.report_path(), REJECTED_ROSE).unwrap();
        let engine = Arc::new(ScriptedEngine {
            report: None,
            exit_code: 0,
            runs: AtomicUsize::new(0),
        });
        let pipeline = OrderPipeline::new(config.clone(), engine);

        let outcome = pipeline.submit_orders(&[rose_order()]).await.unwrap();

        assert!(outcome.execution_report.is_empty());
        assert_eq!(outcome.order_book.stats.total, 0);
        assert!(!stash_path(&config.report_path()).exists());
        assert!(pipeline.current_report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_with_negative_size_decodes_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = OrderPipeline::new(
            PipelineConfig::rooted_at(dir.path()),
            Arc::new(ScriptedEngine::writing(
                "Order ID, Client Order ID, Instrument, Side, Execution Status, Quantity, Price, error\nord1,x1,Rose,1,Rejected,-10,5,Invalid size\n",
            )),
        );

        let outcome = pipeline
            .submit_file(b"Client Order ID,Instrument,Side,Quantity,Price\nx1,Rose,1,-10,5\n")
            .await
            .unwrap();

        assert_eq!(outcome.execution_report[0].quantity.value(), -10);
        assert_eq!(outcome.order_book.stats.rejected, 1);
        assert_eq!(pipeline.current_order_book().await.unwrap(), outcome.order_book);
    }

    #[tokio::test]
    async fn test_malformed_report_fails_submission() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = OrderPipeline::new(
            PipelineConfig::rooted_at(dir.path()),
            Arc::new(ScriptedEngine::writing(
                "Order ID, Client Order ID, Instrument, Side, Execution Status, Quantity, Price\nord1,aa13,Rose,1,New,100,abc\n",
            )),
        );

        let err = pipeline.submit_orders(&[rose_order()]).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedRecord);
    }

    #[tokio::test]
    async fn test_submit_file_uses_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());

        struct EchoBatch;

        #[async_trait]
        impl EngineRunner for EchoBatch {
            async fn run(&self, job: &EngineJob) -> Result<EngineOutput, PipelineError> {
                let batch = std::fs::read_to_string(&job.batch_path).unwrap();
                Ok(EngineOutput {
                    exit_code: Some(0),
                    stdout: batch,
                    stderr: String::new(),
                })
            }
        }

        let pipeline = OrderPipeline::new(config, Arc::new(EchoBatch));
        let upload = "Client Order ID,Instrument,Side,Quantity,Price\nzz1,Lotus,2,20,3\n";

        let outcome = pipeline.submit_file(upload.as_bytes()).await.unwrap();
        assert_eq!(outcome.engine_output, upload);
        assert!(outcome.execution_report.is_empty());
    }

    #[tokio::test]
    async fn test_empty_upload_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::writing(REJECTED_ROSE));
        let pipeline = OrderPipeline::new(PipelineConfig::rooted_at(dir.path()), engine.clone());

        let err = pipeline.submit_file(b" \n").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert_eq!(engine.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_current_report_without_report_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::writing(REJECTED_ROSE));
        let pipeline = OrderPipeline::new(PipelineConfig::rooted_at(dir.path()), engine.clone());

        assert!(pipeline.current_report().await.unwrap().is_empty());
        assert_eq!(
            pipeline.current_order_book().await.unwrap(),
            OrderBookProjection::default()
        );
        assert_eq!(engine.runs.load(Ordering::SeqCst), 0);
    }
}
