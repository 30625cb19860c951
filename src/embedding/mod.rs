//! Embedding generation for semantic search and retrieval.

mod hash;
mod openai;

pub use hash::HashEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{CuebaseError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CuebaseError::Provider("Empty embedding response".to_string()))
    }

    /// Generate embeddings for multiple texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Short provider name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Build the embedder selected by configuration.
///
/// `auto` uses OpenAI when `OPENAI_API_KEY` is set and the offline hash
/// embedder otherwise.
pub fn create_embedder(settings: &EmbeddingSettings, timeout_secs: u64) -> Result<Arc<dyn Embedder>> {
    let dimensions = settings.dimensions as usize;

    let provider = match settings.provider {
        EmbeddingProvider::Auto if crate::openai::is_api_key_configured() => EmbeddingProvider::OpenAI,
        EmbeddingProvider::Auto => EmbeddingProvider::Hash,
        other => other,
    };

    let embedder: Arc<dyn Embedder> = match provider {
        EmbeddingProvider::OpenAI => {
            Arc::new(OpenAIEmbedder::with_config(&settings.model, dimensions, timeout_secs)?)
        }
        _ => Arc::new(HashEmbedder::new(dimensions)?),
    };

    info!("Using {} embeddings ({} dimensions)", embedder.name(), dimensions);
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hash_embedder() {
        let settings = EmbeddingSettings {
            provider: EmbeddingProvider::Hash,
            model: "unused".to_string(),
            dimensions: 64,
        };
        let embedder = create_embedder(&settings, 5).unwrap();
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.dimensions(), 64);
    }
}
