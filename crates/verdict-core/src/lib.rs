//! Core of the change-approval gate: policy rules, diff analysis, risk
//! scoring, explanation, enrichment, the decision pipeline, and the SQLite
//! store backing risk cards.

pub mod card;
pub mod diff;
pub mod enrich;
pub mod explain;
pub mod pipeline;
pub mod policy;
pub mod sandbox;
pub mod scoring;
pub mod store;

pub use card::{
    Action, CheckName, CheckResult, DiffAnalysis, DryRunError, DryRunResult, RiskCard, RiskLevel,
    Status,
};
pub use pipeline::{Decision, Pipeline};
pub use sandbox::Sandbox;
pub use store::DecisionStore;

/// Initialize JSON logging with env-filter support.
/// Call once at application startup.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
