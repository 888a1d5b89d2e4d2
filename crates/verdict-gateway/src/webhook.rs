//! Best-effort webhook notifications for blocked decisions. Delivery
//! failures are logged and swallowed; they never affect the response.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, ClientBuilder};
use serde_json::json;
use tracing::debug;

use verdict_core::RiskCard;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts decision notifications to a configured URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        let client = ClientBuilder::new()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client, url }
    }

    /// Deliver a notification for a card. Never fails.
    pub async fn notify(&self, card: &RiskCard) {
        let failed_checks: Vec<&str> = card
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect();
        let payload = json!({
            "request_id": card.request_id,
            "status": card.status.as_str(),
            "risk_score": card.risk_score,
            "failed_checks": failed_checks,
            "explanation": card.explanation,
            "timestamp": Utc::now().to_rfc3339(),
        });

        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(url = %self.url, status = %response.status(), "webhook delivery rejected");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(url = %self.url, error = %e, "webhook delivery failed");
            }
        }
    }
}
