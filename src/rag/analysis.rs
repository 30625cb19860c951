//! Whole-video analysis and conversation titles.

use super::{ChatMessage, GenerationRequest, Generator};
use crate::config::{Prompts, RagSettings};
use crate::error::{CuebaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Transcript characters sent for analysis.
pub const ANALYSIS_MAX_CHARS: usize = 15_000;
/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 50;

const TRUNCATION_MARKER: &str = "\n\n[Content truncated for analysis]";

/// Summary, outline and key terms of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoAnalysis {
    pub summary: String,
    pub outline: Vec<OutlineEntry>,
    pub key_terms: Vec<String>,
}

/// One section of a video outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineEntry {
    /// As written by the model, e.g. `1:05`.
    pub timestamp: String,
    pub topic: String,
}

/// Runs analysis and title generation against a [`Generator`].
pub struct ContentAnalyzer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    settings: RagSettings,
}

impl ContentAnalyzer {
    pub fn new(generator: Arc<dyn Generator>, settings: RagSettings) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
            settings,
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Summarize a transcript. Generation and malformed responses are
    /// provider errors.
    #[instrument(skip_all, fields(chars = transcript_text.chars().count()))]
    pub async fn analyze(&self, transcript_text: &str) -> Result<VideoAnalysis> {
        let mut vars = HashMap::new();
        vars.insert(
            "transcript_text".to_string(),
            truncate_for_analysis(transcript_text),
        );

        let request = GenerationRequest {
            model: self.settings.analysis_model.clone(),
            system: self
                .prompts
                .render_with_custom(&self.prompts.rag.analysis_system, &HashMap::new()),
            messages: vec![ChatMessage::user(
                self.prompts.render_with_custom(&self.prompts.rag.analysis_user, &vars),
            )],
            temperature: self.settings.temperature,
            max_tokens: self.settings.analysis_max_tokens,
            json: true,
        };

        let text = self.generator.generate(&request).await?;
        let analysis: VideoAnalysis = serde_json::from_str(text.trim()).map_err(|e| {
            CuebaseError::Provider(format!("Analysis response is not valid JSON: {}", e))
        })?;

        info!(
            "Analysis complete: {} outline entries, {} key terms",
            analysis.outline.len(),
            analysis.key_terms.len()
        );
        Ok(analysis)
    }

    /// A short title for a conversation that starts with `first_question`.
    ///
    /// Never fails: falls back to the truncated question.
    pub async fn session_title(&self, first_question: &str) -> String {
        let fallback = || truncate_chars(first_question.trim(), TITLE_MAX_CHARS);

        let mut vars = HashMap::new();
        vars.insert("first_question".to_string(), first_question.to_string());

        let request = GenerationRequest {
            model: self.settings.title_model.clone(),
            system: self
                .prompts
                .render_with_custom(&self.prompts.rag.title_system, &HashMap::new()),
            messages: vec![ChatMessage::user(
                self.prompts.render_with_custom(&self.prompts.rag.title_user, &vars),
            )],
            temperature: self.settings.temperature,
            max_tokens: self.settings.title_max_tokens,
            json: false,
        };

        match self.generator.generate(&request).await {
            Ok(text) => {
                let title = text.trim().trim_matches(|c| matches!(c, '"' | '\'')).trim();
                if title.is_empty() {
                    return fallback();
                }
                debug!("Session title: {:?}", title);
                truncate_chars(title, TITLE_MAX_CHARS)
            }
            Err(e) => {
                warn!("Failed to generate session title: {}", e);
                fallback()
            }
        }
    }
}

/// Cap `text` at [`ANALYSIS_MAX_CHARS`], marking the cut.
pub fn truncate_for_analysis(text: &str) -> String {
    if text.chars().count() <= ANALYSIS_MAX_CHARS {
        return text.to_string();
    }
    let mut truncated = truncate_chars(text, ANALYSIS_MAX_CHARS);
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns one fixed reply (or failure) and records requests.
    struct FixedGenerator {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FixedGenerator {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("timeout".to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(CuebaseError::Provider)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_json() {
        let generator = FixedGenerator::ok(
            r#"{"summary": "Ownership basics.", "outline": [{"timestamp": "0:00", "topic": "Intro"}], "key_terms": ["borrow", "move"]}"#,
        );
        let analyzer = ContentAnalyzer::new(generator.clone(), RagSettings::default());

        let analysis = analyzer.analyze("Welcome. Today: ownership.").await.unwrap();
        assert_eq!(analysis.summary, "Ownership basics.");
        assert_eq!(
            analysis.outline,
            vec![OutlineEntry {
                timestamp: "0:00".to_string(),
                topic: "Intro".to_string()
            }]
        );
        assert_eq!(analysis.key_terms, vec!["borrow", "move"]);

        let requests = generator.requests.lock().unwrap();
        assert!(requests[0].json);
        assert_eq!(requests[0].model, "gpt-4o");
        assert!(requests[0].messages[0].content.contains("Today: ownership."));
    }

    #[tokio::test]
    async fn test_analyze_missing_keys_default() {
        let analyzer = ContentAnalyzer::new(FixedGenerator::ok(r#"{"summary": "Short."}"#), RagSettings::default());

        let analysis = analyzer.analyze("text").await.unwrap();
        assert_eq!(analysis.summary, "Short.");
        assert!(analysis.outline.is_empty());
        assert!(analysis.key_terms.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_non_json() {
        let analyzer = ContentAnalyzer::new(FixedGenerator::ok("Sure! Here is a summary."), RagSettings::default());

        let err = analyzer.analyze("text").await.unwrap_err();
        assert!(matches!(err, CuebaseError::Provider(_)));
    }

    #[test]
    fn test_truncate_for_analysis() {
        assert_eq!(truncate_for_analysis("short"), "short");

        let long = "é".repeat(ANALYSIS_MAX_CHARS + 10);
        let truncated = truncate_for_analysis(&long);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            truncated.chars().count(),
            ANALYSIS_MAX_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[tokio::test]
    async fn test_session_title_is_cleaned_and_capped() {
        let analyzer = ContentAnalyzer::new(
            FixedGenerator::ok("\"Understanding Rust Ownership and the Borrow Checker in Depth\"\n"),
            RagSettings::default(),
        );

        let title = analyzer.session_title("What is ownership?").await;
        assert_eq!(title, "Understanding Rust Ownership and the Borrow Checke");
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_session_title_falls_back_to_question() {
        let analyzer = ContentAnalyzer::new(FixedGenerator::failing(), RagSettings::default());

        let question = "Why does the borrow checker reject two mutable references to the same value?";
        let title = analyzer.session_title(question).await;
        assert_eq!(title, question.chars().take(TITLE_MAX_CHARS).collect::<String>());
    }
}
