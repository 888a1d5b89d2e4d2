//! HTTP gateway for the change-approval pipeline: action submission, risk
//! card lookup and history, approvals, health, and request metrics.

pub mod metrics;
pub mod server;
pub mod types;
pub mod webhook;

pub use metrics::Metrics;
pub use server::{create_router, start_server, AppState, MAX_CONTENTS_LENGTH};
pub use webhook::WebhookNotifier;
