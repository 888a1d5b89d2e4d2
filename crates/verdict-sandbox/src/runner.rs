//! Shell test-command execution with a hard timeout.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

/// Captured output of a completed test run.
pub struct TestRunOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Ways a test run can fail to produce output.
#[derive(Debug)]
pub enum TestRunError {
    Timeout,
    Spawn(std::io::Error),
}

/// Run `command` through `sh -c` inside `dir`, killing it at `timeout`.
pub async fn run_test_command(
    command: &str,
    dir: &Path,
    timeout: Duration,
) -> Result<TestRunOutput, TestRunError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(dir)
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => Err(TestRunError::Timeout),
        Ok(Err(e)) => Err(TestRunError::Spawn(e)),
        Ok(Ok(output)) => Ok(TestRunOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
    }
}
