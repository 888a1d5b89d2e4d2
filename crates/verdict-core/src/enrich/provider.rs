use anyhow::Result;
use async_trait::async_trait;

/// Text-completion provider seam, abstraction over OpenRouter-style APIs.
///
/// Implementations enforce their own request timeout. Callers treat any Err
/// as "enrichment unavailable" and degrade; the error variants exist so the
/// degraded path can log the cause (timeout vs auth vs malformed response).
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete a prompt. Ok(None) means the provider answered with empty
    /// content, which callers treat the same as unavailable.
    async fn complete(&self, prompt: &str) -> Result<Option<String>>;

    /// Provider model name for logging.
    fn model_name(&self) -> &str;
}
