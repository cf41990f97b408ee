//! Embedding Client: strings in, one vector per string out.
//!
//! One batched call is attempted first. Provider batch endpoints have been seen
//! to return fewer or empty vectors under load, so unless the batch answer has
//! exactly one vector per input (and the first is non-empty), every input is
//! re-requested on its own. Items that still fail come back as `[]`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

impl EmbeddingError {
    /// 429/500/503 and transport-level failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Http(_) => true,
            EmbeddingError::Status { status, .. } => matches!(status, 429 | 500 | 503),
            EmbeddingError::Malformed(_) => false,
        }
    }
}

/// Raw provider call. Returns whatever the provider sent back, unvalidated.
#[async_trait]
pub trait EmbeddingTransport: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const BATCH: RetryPolicy = RetryPolicy {
        attempts: 6,
        base_delay: Duration::from_millis(250),
        max_delay: Duration::from_millis(8000),
    };

    pub const PER_ITEM: RetryPolicy = RetryPolicy {
        attempts: 5,
        base_delay: Duration::from_millis(250),
        max_delay: Duration::from_millis(8000),
    };

    /// Delay before retry `attempt` (0-based): base · 2^attempt, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, EmbeddingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EmbeddingError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < policy.attempts => {
                let delay = policy.delay(attempt);
                warn!(
                    "Embedding call attempt {} failed ({}), retrying after {}ms...",
                    attempt + 1,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Clone)]
pub struct EmbeddingClient {
    transport: Option<Arc<dyn EmbeddingTransport>>,
    batch_policy: RetryPolicy,
    item_policy: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(transport: Arc<dyn EmbeddingTransport>) -> Self {
        Self {
            transport: Some(transport),
            batch_policy: RetryPolicy::BATCH,
            item_policy: RetryPolicy::PER_ITEM,
        }
    }

    /// A client with no provider: every input maps to `[]`, which sends
    /// similarity down the Jaccard path.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            batch_policy: RetryPolicy::BATCH,
            item_policy: RetryPolicy::PER_ITEM,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Embeds `inputs`, returning exactly `inputs.len()` vectors in input order.
    pub async fn embed(&self, inputs: &[String]) -> Vec<Vec<f32>> {
        if inputs.is_empty() {
            return vec![];
        }
        let Some(transport) = self.transport.as_deref() else {
            return vec![Vec::new(); inputs.len()];
        };

        match with_retry(self.batch_policy, || transport.embed_batch(inputs)).await {
            Ok(vectors)
                if vectors.len() == inputs.len()
                    && vectors.first().is_some_and(|v| !v.is_empty()) =>
            {
                debug!("Embedded {} strings in one batch", inputs.len());
                return vectors;
            }
            Ok(vectors) => warn!(
                "Embedding batch returned {} vectors for {} inputs; falling back to per-item calls",
                vectors.len(),
                inputs.len()
            ),
            Err(e) => warn!("Embedding batch failed ({e}); falling back to per-item calls"),
        }

        let mut out = Vec::with_capacity(inputs.len());
        for input in inputs {
            let single = std::slice::from_ref(input);
            match with_retry(self.item_policy, || transport.embed_batch(single)).await {
                Ok(mut vectors) if !vectors.is_empty() => out.push(vectors.swap_remove(0)),
                Ok(_) => out.push(Vec::new()),
                Err(e) => {
                    warn!("Embedding for {input:?} failed: {e}");
                    out.push(Vec::new());
                }
            }
        }
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible HTTP transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingTransport {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl HttpEmbeddingTransport {
    pub fn new(client: Client, url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl EmbeddingTransport for HttpEmbeddingTransport {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let mut parsed: EmbeddingResponse =
            serde_json::from_str(&body).map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
