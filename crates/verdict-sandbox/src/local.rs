//! Local dry-run backend: copies the project template into a temp directory,
//! applies the proposed change, and runs the test command there.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use verdict_core::card::{DryRunError, DryRunResult};
use verdict_core::Sandbox;

use crate::diff_text::unified_diff;
use crate::runner::{run_test_command, TestRunError};
use crate::workdir::{copy_dir_all, stage_change, tail, TAIL_CHARS};

pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Sandbox backed by a local project template on disk.
pub struct LocalSandbox {
    template_dir: PathBuf,
    test_command: String,
    timeout: Duration,
}

impl LocalSandbox {
    pub fn new(template_dir: PathBuf, test_command: String, timeout: Duration) -> Self {
        Self {
            template_dir,
            test_command,
            timeout,
        }
    }
}

#[async_trait]
impl Sandbox for LocalSandbox {
    async fn run(&self, file_path: &str, new_contents: &str) -> DryRunResult {
        let workdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => return exec_error(format!("failed to create work directory: {e}")),
        };
        if let Err(e) = copy_dir_all(&self.template_dir, workdir.path()) {
            return exec_error(format!("failed to stage project template: {e:#}"));
        }
        let old = match stage_change(workdir.path(), file_path, new_contents) {
            Ok(old) => old,
            Err(e) => return exec_error(format!("failed to apply change: {e:#}")),
        };
        let diff = unified_diff(&old, new_contents, file_path);

        debug!(file_path, command = %self.test_command, "running local dry run");
        match run_test_command(&self.test_command, workdir.path(), self.timeout).await {
            Ok(output) => DryRunResult {
                passed: output.success,
                diff,
                stdout_tail: tail(&output.stdout, TAIL_CHARS),
                stderr_tail: tail(&output.stderr, TAIL_CHARS),
                error_kind: None,
            },
            Err(TestRunError::Timeout) => {
                warn!(file_path, timeout_secs = self.timeout.as_secs(), "local dry run timed out");
                DryRunResult {
                    passed: false,
                    diff: String::new(),
                    stdout_tail: String::new(),
                    stderr_tail: "test run timed out".to_string(),
                    error_kind: Some(DryRunError::Timeout),
                }
            }
            Err(TestRunError::Spawn(e)) => exec_error(format!("failed to run tests: {e}")),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn exec_error(message: String) -> DryRunResult {
    DryRunResult {
        passed: false,
        diff: String::new(),
        stdout_tail: String::new(),
        stderr_tail: message,
        error_kind: Some(DryRunError::ExecError),
    }
}
