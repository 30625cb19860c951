//! Configuration module for Cuebase.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings, OpenAISettings,
    PromptSettings, RagSettings, RetrievalSettings, Settings, VectorStoreSettings,
};
