//! RAG (Retrieval-Augmented Generation) answers grounded in a video's
//! transcript.

mod analysis;
mod composer;
mod generator;

pub use analysis::{
    truncate_for_analysis, ContentAnalyzer, OutlineEntry, VideoAnalysis, ANALYSIS_MAX_CHARS,
    TITLE_MAX_CHARS,
};
pub use composer::{format_context, AnswerComposer, ComposedAnswer, NO_CONTEXT};
pub use generator::{GenerationRequest, Generator, OpenAIGenerator};

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
