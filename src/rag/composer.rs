//! Answer composition from retrieved transcript chunks.

use super::{ChatMessage, GenerationRequest, Generator};
use crate::config::{Prompts, RagSettings};
use crate::error::Result;
use crate::vector_store::RetrievalResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Context block used when nothing was retrieved.
pub const NO_CONTEXT: &str = "No relevant transcript content found.";

const ENGAGEMENT_MAX_CHARS: usize = 100;
const ENGAGEMENT_EXCERPT_CHARS: usize = 200;

/// An answer plus the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct ComposedAnswer {
    pub answer: String,
    pub referenced_chunks: Vec<RetrievalResult>,
    /// Short follow-up question about the current moment of the video.
    pub context_prompt: Option<String>,
}

/// Builds prompts from retrieved chunks and calls the generator.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    settings: RagSettings,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>, settings: RagSettings) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
            settings,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer `question` from `chunks`.
    ///
    /// The first `context_count` chunks are the timestamp-window chunks,
    /// nearest first. The engagement prompt is only attempted when there is at
    /// least one of them, and is best-effort: only the primary generation can
    /// fail the call.
    #[instrument(skip_all, fields(chunks = chunks.len(), context = context_count, history = history.len()))]
    pub async fn compose(
        &self,
        chunks: &[RetrievalResult],
        context_count: usize,
        question: &str,
        history: &[ChatMessage],
        timestamp: Option<f64>,
    ) -> Result<ComposedAnswer> {
        let request = self.answer_request(chunks, question, history);
        let answer = self.generator.generate(&request).await?;

        let anchor = chunks[..context_count.min(chunks.len())].first();
        let context_prompt = match (timestamp, anchor) {
            (Some(t), Some(anchor)) if self.settings.engagement_enabled => {
                self.engagement_prompt(anchor, t).await
            }
            _ => None,
        };

        Ok(ComposedAnswer {
            answer,
            referenced_chunks: chunks.to_vec(),
            context_prompt,
        })
    }

    fn answer_request(
        &self,
        chunks: &[RetrievalResult],
        question: &str,
        history: &[ChatMessage],
    ) -> GenerationRequest {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context(chunks));
        vars.insert("question".to_string(), question.to_string());

        let recent = history.len().saturating_sub(self.settings.history_limit);
        let mut messages: Vec<ChatMessage> = history[recent..].to_vec();
        messages.push(ChatMessage::user(
            self.prompts.render_with_custom(&self.prompts.rag.user, &vars),
        ));

        GenerationRequest {
            model: self.settings.model.clone(),
            system: self.prompts.render_with_custom(&self.prompts.rag.system, &HashMap::new()),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            json: false,
        }
    }

    async fn engagement_prompt(&self, anchor: &RetrievalResult, timestamp: f64) -> Option<String> {
        let mut vars = HashMap::new();
        vars.insert("timestamp".to_string(), (timestamp.max(0.0) as u64).to_string());
        vars.insert(
            "current_content".to_string(),
            anchor.text.chars().take(ENGAGEMENT_EXCERPT_CHARS).collect(),
        );

        let request = GenerationRequest {
            model: self.settings.engagement_model.clone(),
            system: self
                .prompts
                .render_with_custom(&self.prompts.rag.engagement_system, &HashMap::new()),
            messages: vec![ChatMessage::user(
                self.prompts.render_with_custom(&self.prompts.rag.engagement_user, &vars),
            )],
            temperature: self.settings.temperature,
            max_tokens: self.settings.engagement_max_tokens,
            json: false,
        };

        match self.generator.generate(&request).await {
            Ok(text) => {
                let prompt = clean_engagement_prompt(&text);
                debug!("Engagement prompt: {:?}", prompt);
                prompt
            }
            Err(e) => {
                warn!("Failed to generate engagement prompt: {}", e);
                None
            }
        }
    }
}

/// Render chunks as numbered, timestamped excerpts separated by blank lines.
pub fn format_context(chunks: &[RetrievalResult]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] ({}) {}", i + 1, chunk.to_chunk().time_range(), chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn clean_engagement_prompt(text: &str) -> Option<String> {
    let cleaned = text
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”'))
        .trim();

    if cleaned.is_empty() {
        return None;
    }

    Some(cleaned.chars().take(ENGAGEMENT_MAX_CHARS).collect())
}
