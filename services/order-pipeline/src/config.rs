//! Pipeline configuration
//!
//! All file locations are fixed per process. Relative batch, report and
//! engine paths resolve against `project_root`, which is also the engine's
//! working directory. An engine path without any directory component is
//! looked up on `PATH` instead.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working directory of the engine process
    pub project_root: PathBuf,
    /// Matching engine executable
    pub engine_path: PathBuf,
    /// Extra arguments; `{batch}` and `{report}` expand to the resolved paths
    pub engine_args: Vec<String>,
    /// Encoded order batch the engine reads
    pub batch_file: PathBuf,
    /// Execution report the engine writes
    pub report_file: PathBuf,
    /// Kill the engine after this many seconds; 0 waits indefinitely
    pub engine_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            engine_path: PathBuf::from("./flower_exchange"),
            engine_args: Vec::new(),
            batch_file: PathBuf::from("temp_orders.csv"),
            report_file: PathBuf::from("Execution_Rep.csv"),
            engine_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Default layout rooted at `project_root`
    pub fn rooted_at(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    pub fn batch_path(&self) -> PathBuf {
        self.project_root.join(&self.batch_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.project_root.join(&self.report_file)
    }

    pub fn engine_program(&self) -> PathBuf {
        if is_bare_command(&self.engine_path) {
            self.engine_path.clone()
        } else {
            self.project_root.join(&self.engine_path)
        }
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        match self.engine_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn is_bare_command(path: &Path) -> bool {
    path.is_relative() && path.components().count() == 1
}
