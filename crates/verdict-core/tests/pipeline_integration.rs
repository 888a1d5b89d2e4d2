//! End-to-end pipeline runs against stub sandboxes and a temporary store.

use std::sync::Arc;

use async_trait::async_trait;
use verdict_core::card::{DryRunError, DryRunResult};
use verdict_core::{Action, CheckName, DecisionStore, Pipeline, RiskLevel, Sandbox, Status};

struct StubSandbox {
    name: &'static str,
    result: DryRunResult,
}

#[async_trait]
impl Sandbox for StubSandbox {
    async fn run(&self, _file_path: &str, _new_contents: &str) -> DryRunResult {
        self.result.clone()
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn passing_run(diff: &str) -> DryRunResult {
    DryRunResult {
        passed: true,
        diff: diff.to_string(),
        stdout_tail: "3 passed".to_string(),
        stderr_tail: String::new(),
        error_kind: None,
    }
}

fn failing_run(stderr: &str) -> DryRunResult {
    DryRunResult {
        passed: false,
        diff: "+x = 1\n".to_string(),
        stdout_tail: String::new(),
        stderr_tail: stderr.to_string(),
        error_kind: None,
    }
}

fn local(result: DryRunResult) -> Arc<dyn Sandbox> {
    Arc::new(StubSandbox {
        name: "stub-local",
        result,
    })
}

fn store() -> (tempfile::TempDir, Arc<DecisionStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DecisionStore::open(&dir.path().join("verdict.db")).unwrap());
    (dir, store)
}

fn action(intent: &str, file_path: &str, remote: bool) -> Action {
    Action {
        intent: intent.to_string(),
        file_path: file_path.to_string(),
        new_contents: "service: api\npagination: 50\n".to_string(),
        use_remote_sandbox: remote,
    }
}

// ── Local decisions ──

#[tokio::test]
async fn test_clean_change_is_allowed_and_persisted() {
    let (_dir, store) = store();
    let diff = "--- config/app.yaml\n+++ config/app.yaml\n-pagination: 10\n+pagination: 50\n";
    let pipeline = Pipeline::new(local(passing_run(diff)), store.clone());

    let decision = pipeline
        .submit(action("raise pagination", "config/app.yaml", false))
        .await
        .unwrap();

    assert!(decision.allowed);
    let card = &decision.card;
    assert_eq!(card.status, Status::Allow);
    assert_eq!(card.risk_score, 10);
    assert_eq!(card.risk_level, RiskLevel::Low);
    assert_eq!(card.checks.len(), 2);
    assert!(card.checks.iter().all(|c| c.passed));
    assert_eq!(card.diff_analysis.lines_added, 1);
    assert!(card.execution_time_ms.is_some());

    let persisted = store.get(&card.request_id).unwrap().unwrap();
    assert_eq!(persisted.status, Status::Allow);
    assert_eq!(pipeline.latest().await.unwrap().request_id, card.request_id);
}

#[tokio::test]
async fn test_destructive_intent_blocks_before_sandbox() {
    let (_dir, store) = store();
    let pipeline = Pipeline::new(local(passing_run("+anything\n")), store.clone());

    let decision = pipeline
        .submit(action("Delete stale flags", "config/app.yaml", false))
        .await
        .unwrap();

    assert!(!decision.allowed);
    let card = &decision.card;
    assert_eq!(card.status, Status::Blocked);
    // Policy failure only; the sandbox never ran.
    assert_eq!(card.checks.len(), 1);
    assert_eq!(card.checks[0].name, CheckName::Policy);
    assert_eq!(card.checks[0].message, "Destructive intent blocked");
    assert!(card.diff.is_empty());
    assert_eq!(card.diff_analysis.summary, "No changes detected");
    // 50 base + 15 generic + 20 policy
    assert_eq!(card.risk_score, 85);
    assert_eq!(card.risk_level, RiskLevel::Critical);
    assert!(card
        .explanation
        .contains("policy violation: Destructive intent blocked"));
    assert!(store.get(&card.request_id).unwrap().is_some());
}

#[tokio::test]
async fn test_failing_tests_block() {
    let (_dir, store) = store();
    let pipeline = Pipeline::new(local(failing_run("assert 1 == 2")), store);

    let decision = pipeline
        .submit(action("tune config", "config/app.yaml", false))
        .await
        .unwrap();

    assert!(!decision.allowed);
    let card = &decision.card;
    assert_eq!(card.status, Status::Blocked);
    let sandbox = card
        .checks
        .iter()
        .find(|c| c.name == CheckName::Sandbox)
        .unwrap();
    assert!(!sandbox.passed);
    assert_eq!(sandbox.message, "assert 1 == 2");
    // 50 base + 15 generic + 25 sandbox
    assert_eq!(card.risk_score, 90);
    assert_eq!(card.risk_level, RiskLevel::Critical);
    assert!(card.explanation.contains("sandbox tests failed"));
}

// ── Remote backend ──

#[tokio::test]
async fn test_unreachable_remote_falls_back_to_local() {
    let (_dir, store) = store();
    let remote = Arc::new(StubSandbox {
        name: "stub-remote",
        result: DryRunResult {
            passed: false,
            diff: String::new(),
            stdout_tail: String::new(),
            stderr_tail: "git not installed".to_string(),
            error_kind: Some(DryRunError::BackendUnavailable),
        },
    });
    let pipeline =
        Pipeline::new(local(passing_run("+pagination: 50\n")), store).with_remote(remote);

    let decision = pipeline
        .submit(action("tune config", "config/app.yaml", true))
        .await
        .unwrap();

    // Fallback still allows, but the remote failure stays visible.
    assert!(decision.allowed);
    let card = &decision.card;
    let names: Vec<CheckName> = card.checks.iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec![CheckName::Policy, CheckName::RemoteSandbox, CheckName::Sandbox]
    );
    let remote_check = &card.checks[1];
    assert!(!remote_check.passed);
    assert_eq!(remote_check.message, "git not installed");
    assert!(card.checks[2].passed);
    // 10 base + 15 generic for the failed remote check
    assert_eq!(card.risk_score, 25);
    assert_eq!(card.risk_level, RiskLevel::Medium);
}

#[tokio::test]
async fn test_remote_timeout_falls_back_to_local() {
    let (_dir, store) = store();
    let remote = Arc::new(StubSandbox {
        name: "stub-remote",
        result: DryRunResult {
            passed: false,
            diff: String::new(),
            stdout_tail: String::new(),
            stderr_tail: "remote tests timed out".to_string(),
            error_kind: Some(DryRunError::Timeout),
        },
    });
    let pipeline =
        Pipeline::new(local(passing_run("+pagination: 50\n")), store).with_remote(remote);

    let decision = pipeline
        .submit(action("tune config", "config/app.yaml", true))
        .await
        .unwrap();

    // Exactly one backend is authoritative; the local result decides.
    assert!(decision.allowed);
    let card = &decision.card;
    let remote_check = card
        .checks
        .iter()
        .find(|c| c.name == CheckName::RemoteSandbox)
        .unwrap();
    assert!(!remote_check.passed);
    assert_eq!(remote_check.message, "remote tests timed out");
    let sandbox = card
        .checks
        .iter()
        .find(|c| c.name == CheckName::Sandbox)
        .unwrap();
    assert!(sandbox.passed);
}

#[tokio::test]
async fn test_remote_result_is_authoritative_when_it_executes() {
    let (_dir, store) = store();
    let remote = Arc::new(StubSandbox {
        name: "stub-remote",
        result: failing_run("remote assert failed"),
    });
    // A passing local run must not rescue a remote test failure.
    let pipeline =
        Pipeline::new(local(passing_run("+pagination: 50\n")), store).with_remote(remote);

    let decision = pipeline
        .submit(action("tune config", "config/app.yaml", true))
        .await
        .unwrap();

    assert!(!decision.allowed);
    let card = &decision.card;
    let remote_check = card
        .checks
        .iter()
        .find(|c| c.name == CheckName::RemoteSandbox)
        .unwrap();
    assert!(remote_check.passed);
    assert_eq!(remote_check.message, "executed on stub-remote");
    let sandbox = card
        .checks
        .iter()
        .find(|c| c.name == CheckName::Sandbox)
        .unwrap();
    assert!(!sandbox.passed);
    assert_eq!(sandbox.message, "remote assert failed");
}

#[tokio::test]
async fn test_remote_requested_but_not_configured() {
    let (_dir, store) = store();
    let pipeline = Pipeline::new(local(passing_run("+pagination: 50\n")), store);

    let decision = pipeline
        .submit(action("tune config", "config/app.yaml", true))
        .await
        .unwrap();

    assert!(decision.allowed);
    let remote_check = decision
        .card
        .checks
        .iter()
        .find(|c| c.name == CheckName::RemoteSandbox)
        .unwrap();
    assert!(!remote_check.passed);
    assert_eq!(remote_check.message, "remote sandbox not configured");
}

#[tokio::test]
async fn test_latest_tracks_most_recent_submission() {
    let (_dir, store) = store();
    let pipeline = Pipeline::new(local(passing_run("")), store);
    assert!(pipeline.latest().await.is_none());

    let first = pipeline
        .submit(action("first", "config/app.yaml", false))
        .await
        .unwrap();
    let second = pipeline
        .submit(action("second", "config/app.yaml", false))
        .await
        .unwrap();

    assert_ne!(first.card.request_id, second.card.request_id);
    assert_eq!(
        pipeline.latest().await.unwrap().request_id,
        second.card.request_id
    );
}
