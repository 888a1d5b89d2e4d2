use serde::{Deserialize, Serialize};

use verdict_core::RiskCard;

/// Submit an action for evaluation
#[derive(Debug, Deserialize)]
pub struct ProposeActionRequest {
    pub intent: String,
    pub file_path: String,
    pub new_contents: String,
    /// Informational only, recorded nowhere and never evaluated.
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub use_remote_sandbox: bool,
}

/// Decision response for a submitted action
#[derive(Debug, Serialize)]
pub struct ProposeActionResponse {
    pub allowed: bool,
    pub risk_card: RiskCard,
    pub request_id: String,
}

/// Approve a previously recorded risk card
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(default = "default_approver")]
    pub approved_by: String,
    #[serde(default)]
    pub comment: String,
}

fn default_approver() -> String {
    "user".to_string()
}

/// Approval outcome
#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub request_id: String,
    pub approved: bool,
    pub approved_by: String,
}

/// Recent risk cards, most recent first
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<RiskCard>,
}

/// Query params for history listing
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
