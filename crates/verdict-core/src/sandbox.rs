use async_trait::async_trait;

use crate::card::DryRunResult;

/// Isolated dry-run execution seam.
///
/// Implementations never return an error: every failure mode (test failure,
/// timeout, missing backend) is encoded in the `DryRunResult` so the pipeline
/// can score and explain it like any other outcome.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Apply `new_contents` at `file_path` in an isolated copy of the project
    /// and run the test suite against it.
    async fn run(&self, file_path: &str, new_contents: &str) -> DryRunResult;

    /// Backend name for logging and check messages.
    fn name(&self) -> &str;
}
