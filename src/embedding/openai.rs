//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{CuebaseError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Maximum number of inputs sent in one embeddings request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder with the default model and dimensions.
    pub fn new() -> Result<Self> {
        Self::with_config("text-embedding-3-small", 1536, crate::openai::DEFAULT_TIMEOUT_SECS)
    }

    /// Create an embedder with a custom model, dimensions and request timeout.
    pub fn with_config(model: &str, dimensions: usize, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(timeout_secs))?,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| CuebaseError::Provider(format!("Failed to build embedding request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| CuebaseError::Provider(format!("Embedding API error: {}", e)))?;

            if response.data.len() != batch.len() {
                return Err(CuebaseError::Provider(format!(
                    "Embedding API returned {} vectors for {} inputs",
                    response.data.len(),
                    batch.len()
                )));
            }

            let mut data = response.data;
            data.sort_by_key(|e| e.index);
            all_embeddings.extend(data.into_iter().map(|e| e.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAIEmbedder::new().unwrap();
        assert_eq!(embedder.dimensions(), 1536);
        assert_eq!(embedder.name(), "openai");

        let embedder = OpenAIEmbedder::with_config("text-embedding-3-large", 3072, 30).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }
}
