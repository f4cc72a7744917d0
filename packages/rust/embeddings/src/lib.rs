//! Embedding providers for the clustering pipeline.
//!
//! The [`Embedder`] contract: one vector per input string, same order,
//! same fixed length within a call. Every provider-side failure —
//! transport, HTTP status, decode, or a length/order mismatch — surfaces
//! as [`KeywordForgeError::EmbeddingUnavailable`] so callers handle a
//! closed error surface.
//!
//! Two implementations:
//! - [`HttpEmbedder`] — OpenAI-style `/embeddings` endpoint over reqwest.
//! - [`HashEmbedder`] — deterministic local vectors from SHA-256 token
//!   digests; no network, used offline and in tests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use keywordforge_shared::{EmbeddingConfig, KeywordForgeError, Result};

/// Maps a sequence of strings to fixed-length numeric vectors.
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning one vector per input in the same order.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP provider
// ---------------------------------------------------------------------------

/// Request body for an OpenAI-style `/embeddings` call.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// One embedding row in the response.
#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Response body for an OpenAI-style `/embeddings` call.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

/// Embedding provider backed by an HTTP `/embeddings` endpoint.
///
/// One synchronous request per [`Embedder::embed`] call; retries, if any,
/// are the remote service's concern.
#[derive(Debug)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    /// Build a provider for `endpoint` and `model`.
    pub fn new(endpoint: Url, model: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("KeywordForge/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| KeywordForgeError::EmbeddingUnavailable(format!("client build: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key,
        })
    }
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KeywordForgeError::EmbeddingUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeywordForgeError::EmbeddingUnavailable(format!(
                "HTTP {status} from {}",
                self.endpoint
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KeywordForgeError::EmbeddingUnavailable(format!("decode: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(KeywordForgeError::EmbeddingUnavailable(format!(
                "expected {} vectors, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut vectors = vec![Vec::new(); texts.len()];
        for row in parsed.data {
            if row.index >= texts.len() {
                return Err(KeywordForgeError::EmbeddingUnavailable(format!(
                    "vector index {} out of range",
                    row.index
                )));
            }
            vectors[row.index] = row.embedding;
        }

        if let Some(empty) = vectors.iter().position(Vec::is_empty) {
            return Err(KeywordForgeError::EmbeddingUnavailable(format!(
                "missing or empty vector at index {empty}"
            )));
        }

        debug!(
            count = vectors.len(),
            dim = vectors[0].len(),
            "fetched embeddings"
        );

        Ok(vectors)
    }
}

// ---------------------------------------------------------------------------
// Deterministic local provider
// ---------------------------------------------------------------------------

/// Default vector dimension for the hash provider.
pub const HASH_DIM: usize = 16;

/// Deterministic embedding provider derived from SHA-256 token digests.
///
/// Keywords sharing tokens land near each other, which is enough structure
/// for offline runs and for the determinism/coverage tests. Identical text
/// always yields the identical vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: HASH_DIM }
    }

    /// Map one token's digest bytes into `[-1, 1]` components.
    fn token_vector(&self, token: &str) -> Vec<f32> {
        let digest = Sha256::digest(token.as_bytes());
        digest
            .iter()
            .cycle()
            .take(self.dim)
            .map(|&b| b as f32 / 127.5 - 1.0)
            .collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = texts
            .iter()
            .map(|text| {
                let mut sum = vec![0.0f32; self.dim];
                for token in text.split_whitespace() {
                    for (acc, v) in sum.iter_mut().zip(self.token_vector(token)) {
                        *acc += v;
                    }
                }
                let norm = sum.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for v in &mut sum {
                        *v /= norm;
                    }
                }
                sum
            })
            .collect();
        Ok(vectors)
    }
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// Runtime-selected embedding provider, chosen from `[embedding]` config.
#[derive(Debug)]
pub enum AnyEmbedder {
    Http(HttpEmbedder),
    Hash(HashEmbedder),
}

impl AnyEmbedder {
    /// Build a provider from the `[embedding]` config section.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider.as_str() {
            "hash" => Ok(Self::Hash(HashEmbedder::new())),
            "http" => {
                let endpoint = Url::parse(&config.endpoint).map_err(|e| {
                    KeywordForgeError::config(format!(
                        "invalid embedding endpoint '{}': {e}",
                        config.endpoint
                    ))
                })?;
                let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
                Ok(Self::Http(HttpEmbedder::new(
                    endpoint,
                    config.model.clone(),
                    api_key,
                )?))
            }
            other => Err(KeywordForgeError::config(format!(
                "unknown embedding provider '{other}': expected 'hash' or 'http'"
            ))),
        }
    }
}

impl Embedder for AnyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Http(e) => e.embed(texts).await,
            Self::Hash(e) => e.embed(texts).await,
        }
    }
}
