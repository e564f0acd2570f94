//! Engine invoker
//!
//! Runs the external matching engine as a blocking child process. The
//! invoker never looks at what the engine printed; it only decides whether
//! the run succeeded and the report may be decoded.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Everything one engine run needs to know about its file layout
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub working_dir: PathBuf,
    pub batch_path: PathBuf,
    pub report_path: PathBuf,
}

impl EngineJob {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            working_dir: config.project_root.clone(),
            batch_path: config.batch_path(),
            report_path: config.report_path(),
        }
    }
}

/// Captured result of a terminated engine process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    /// Exit code, `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Gate decoding on a clean exit
    pub fn ensure_success(self) -> Result<Self, PipelineError> {
        if self.success() {
            return Ok(self);
        }
        let reason = match self.exit_code {
            Some(code) => format!("engine exited with status {}", code),
            None => "engine terminated by signal".to_string(),
        };
        Err(PipelineError::engine_failed(reason, self.exit_code, self.stderr))
    }
}

/// Launches one matching-engine run
#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// Run the engine to completion against the job's batch file.
    ///
    /// Returns the captured output for any process that terminated; launch
    /// failures and timeouts are `EngineExecutionFailed`.
    async fn run(&self, job: &EngineJob) -> Result<EngineOutput, PipelineError>;
}

/// Engine runner backed by a real executable
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            program: config.engine_program(),
            args: config.engine_args.clone(),
            timeout: config.engine_timeout(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    fn expand_args(&self, job: &EngineJob) -> Vec<String> {
        let batch = job.batch_path.to_string_lossy();
        let report = job.report_path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{batch}", &batch).replace("{report}", &report))
            .collect()
    }
}

#[async_trait]
impl EngineRunner for ProcessEngine {
    async fn run(&self, job: &EngineJob) -> Result<EngineOutput, PipelineError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(job))
            .current_dir(&job.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), "Spawning matching engine");
        let child = cmd.spawn().map_err(|e| {
            error!(program = %self.program.display(), "Failed to launch engine: {}", e);
            PipelineError::engine_failed(format!("failed to launch engine: {}", e), None, "")
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => timeout(limit, child.wait_with_output()).await.map_err(|_| {
                error!(?limit, "Engine timed out");
                PipelineError::engine_failed(
                    format!("engine timed out after {}s", limit.as_secs()),
                    None,
                    "",
                )
            })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|e| {
            PipelineError::engine_failed(format!("failed to collect engine output: {}", e), None, "")
        })?;

        let output = EngineOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        info!(exit_code = ?output.exit_code, "Engine terminated");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(dir: &std::path::Path) -> EngineJob {
        EngineJob::from_config(&PipelineConfig::rooted_at(dir))
    }

    #[test]
    fn test_ensure_success_passes_clean_exit() {
        let output = EngineOutput {
            exit_code: Some(0),
            stdout: "Time taken: 12 microseconds".into(),
            stderr: String::new(),
        };
        assert!(output.clone().ensure_success().is_ok());
    }

    #[test]
    fn test_ensure_success_carries_stderr() {
        let output = EngineOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "Error opening input file\n".into(),
        };
        match output.ensure_success() {
            Err(PipelineError::EngineExecutionFailed { exit_code, stderr, .. }) => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "Error opening input file\n");
            }
            other => panic!("expected EngineExecutionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let output = EngineOutput {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!output.success());
        assert!(output.ensure_success().is_err());
    }

    #[test]
    fn test_args_expand_paths() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("engine")
            .with_args(vec!["--in={batch}".into(), "{report}".into(), "-v".into()]);
        let job = job(dir.path());

        let args = engine.expand_args(&job);
        assert_eq!(args[0], format!("--in={}", job.batch_path.display()));
        assert_eq!(args[1], job.report_path.display().to_string());
        assert_eq!(args[2], "-v");
    }

    #[tokio::test]
    async fn test_missing_executable_is_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new(dir.path().join("no_such_engine"));

        let err = engine.run(&job(dir.path())).await.unwrap_err();
        assert!(matches!(err, PipelineError::EngineExecutionFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("sh").with_args(vec![
            "-c".into(),
            "echo matched; echo broken >&2; exit 3".into(),
        ]);

        let output = engine.run(&job(dir.path())).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "matched\n");
        assert_eq!(output.stderr, "broken\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("sh").with_args(vec!["-c".into(), "pwd".into()]);

        let output = engine.run(&job(dir.path())).await.unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("sh")
            .with_args(vec!["-c".into(), "sleep 5".into()])
            .with_timeout(Some(Duration::from_millis(100)));

        let err = engine.run(&job(dir.path())).await.unwrap_err();
        match err {
            PipelineError::EngineExecutionFailed { reason, .. } => {
                assert!(reason.contains("timed out"))
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }
}
