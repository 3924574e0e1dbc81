use async_trait::async_trait;
use prodsim_core::{EmbeddingProvider, Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Ollama's packaging of all-MiniLM-L6-v2
pub const DEFAULT_OLLAMA_MODEL: &str = "all-minilm";
pub const DEFAULT_OLLAMA_DIM: usize = 384;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Embedding provider backed by an Ollama server's `/api/embed` endpoint.
///
/// Large inputs are split into batches of `batch_size` texts, one request
/// each. Failures are not retried.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "embedding dimension must be positive".to_string(),
            ));
        }

        Ok(Self {
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))?,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.into(),
            dimension,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&BatchEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::Embedding(format!(
                "Ollama returned HTTP {}: {}",
                status, message
            )));
        }

        let body: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed embed response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        body.embeddings
            .into_iter()
            .map(|embedding| {
                if embedding.len() != self.dimension {
                    return Err(Error::DimensionMismatch {
                        expected: self.dimension,
                        actual: embedding.len(),
                    });
                }
                Ok(Vector::new(embedding))
            })
            .collect()
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {}", e)))
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                "Embedding batch {} ({} texts) with model {}",
                i + 1,
                chunk.len(),
                self.model
            );
            vectors.extend(self.embed_chunk(chunk).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
