//! Deterministic offline embeddings.
//!
//! Vectors are derived from the SHA-256 digest of the text: the 32 digest
//! bytes are repeated and truncated to the configured dimension, and each
//! byte is scaled to `[0, 1]`. Same text, same vector, no network.

use super::Embedder;
use crate::error::{CuebaseError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Hash-based embedder for local development and tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(CuebaseError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    /// Compute the vector for one text.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());

        digest
            .iter()
            .cycle()
            .take(self.dimensions)
            .map(|&byte| byte as f32 / 255.0)
            .collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedding_is_pure() {
        let embedder = HashEmbedder::new(1536).unwrap();

        let first = embedder.embed_batch(&["hello".to_string()]).await.unwrap();
        let second = embedder.embed_batch(&["hello".to_string()]).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].len(), 1536);
        let first_bits: Vec<u32> = first[0].iter().map(|f| f.to_bits()).collect();
        let second_bits: Vec<u32> = second[0].iter().map(|f| f.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[tokio::test]
    async fn test_batch_order_and_range() {
        let embedder = HashEmbedder::new(40).unwrap();
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors[0], embedder.vector_for("alpha"));
        assert_eq!(vectors[1], embedder.vector_for("beta"));
        assert_ne!(vectors[0], vectors[1]);
        assert!(vectors.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
        // Digest repeats after 32 components.
        assert_eq!(vectors[0][32..40], vectors[0][0..8]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let embedder = HashEmbedder::new(8).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }
}
