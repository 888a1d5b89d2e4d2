//! Remote dry-run backend: clones a git repository into a temp directory and
//! runs the test command against the staged change there.
//!
//! Every failure mode (git missing, clone failure, timeout) is reported via
//! `error_kind` so the pipeline can fall back to the local backend; only a
//! run whose tests actually executed carries no `error_kind`.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use verdict_core::card::{DryRunError, DryRunResult};
use verdict_core::Sandbox;

use crate::diff_text::unified_diff;
use crate::runner::{run_test_command, TestRunError};
use crate::workdir::{stage_change, tail, TAIL_CHARS};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

const AUTH_FAILURE_MARKERS: &[&str] =
    &["Authentication", "could not read Username", "Permission denied"];

/// Sandbox backed by a clone of a remote git repository.
pub struct RemoteSandbox {
    repo_url: String,
    test_command: String,
    timeout: Duration,
}

impl RemoteSandbox {
    pub fn new(repo_url: String, test_command: String, timeout: Duration) -> Self {
        Self {
            repo_url,
            test_command,
            timeout,
        }
    }

    async fn clone_repo(&self, dest: &Path) -> Result<(), DryRunResult> {
        let mut cmd = Command::new("git");
        cmd.arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(&self.repo_url)
            .arg(dest)
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(backend_unavailable("repository clone timed out".to_string()))
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(backend_unavailable("git not installed".to_string()))
            }
            Ok(Err(e)) => return Err(exec_error(format!("failed to run git: {e}"))),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if AUTH_FAILURE_MARKERS.iter().any(|m| stderr.contains(m)) {
                return Err(exec_error("repository authentication failed".to_string()));
            }
            return Err(exec_error(format!(
                "repository clone failed: {}",
                tail(stderr.trim(), TAIL_CHARS)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Sandbox for RemoteSandbox {
    async fn run(&self, file_path: &str, new_contents: &str) -> DryRunResult {
        let workdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => return exec_error(format!("failed to create work directory: {e}")),
        };

        debug!(repo = %self.repo_url, "cloning repository for remote dry run");
        if let Err(result) = self.clone_repo(workdir.path()).await {
            warn!(repo = %self.repo_url, detail = %result.stderr_tail, "remote dry run unavailable");
            return result;
        }

        let old = match stage_change(workdir.path(), file_path, new_contents) {
            Ok(old) => old,
            Err(e) => return exec_error(format!("failed to apply change: {e:#}")),
        };
        let diff = unified_diff(&old, new_contents, file_path);

        match run_test_command(&self.test_command, workdir.path(), self.timeout).await {
            Ok(output) => DryRunResult {
                passed: output.success,
                diff,
                stdout_tail: tail(&output.stdout, TAIL_CHARS),
                stderr_tail: tail(&output.stderr, TAIL_CHARS),
                error_kind: None,
            },
            Err(TestRunError::Timeout) => {
                warn!(repo = %self.repo_url, "remote dry run timed out");
                DryRunResult {
                    passed: false,
                    diff,
                    stdout_tail: String::new(),
                    stderr_tail: "remote tests timed out".to_string(),
                    error_kind: Some(DryRunError::Timeout),
                }
            }
            Err(TestRunError::Spawn(e)) => exec_error(format!("failed to run tests: {e}")),
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

fn backend_unavailable(message: String) -> DryRunResult {
    DryRunResult {
        passed: false,
        diff: String::new(),
        stdout_tail: String::new(),
        stderr_tail: message,
        error_kind: Some(DryRunError::BackendUnavailable),
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
