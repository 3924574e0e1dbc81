//! Embedding seam
//!
//! The engine never constructs an encoder itself: anything implementing
//! [`EmbeddingProvider`] is injected. [`HashingEmbedder`] is a local,
//! deterministic provider built from character trigrams and words, good
//! enough for lexical lookalikes and for tests.

use crate::{Error, Result, Vector};
use async_trait::async_trait;

/// Default output dimension of [`HashingEmbedder`]
pub const DEFAULT_HASHING_DIM: usize = 256;

const TRIGRAM_WEIGHT: f32 = 1.0;
const WORD_WEIGHT: f32 = 2.0;

/// Text-to-vector encoder
///
/// `embed_batch` returns one vector per input text, in input order, all of
/// length [`dimension`](EmbeddingProvider::dimension). An empty batch
/// returns an empty result. Empty strings are valid input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

/// Feature-hashing encoder over lower-cased trigrams and words
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig(
                "hashing embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    /// Embed a single text. Empty text yields the zero vector.
    pub fn embed_text(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();

        if !lowered.trim().is_empty() {
            let padded: Vec<char> = format!("  {}  ", lowered).chars().collect();
            let mut gram = String::with_capacity(12);
            for window in padded.windows(3) {
                gram.clear();
                gram.extend(window);
                data[self.bucket(&gram)] += TRIGRAM_WEIGHT;
            }
        }

        for word in lowered.split_whitespace() {
            data[self.bucket(word)] += WORD_WEIGHT;
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        vector
    }

    #[inline]
    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.dim as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_HASHING_DIM,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// FNV-1a, stable across processes and platforms so persisted indexes stay
/// comparable with fresh query embeddings.
#[inline]
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}
