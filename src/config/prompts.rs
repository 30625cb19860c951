//! Prompt templates for Cuebase.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System instruction for answering questions.
    pub system: String,
    /// Final user turn. Variables: `{{context}}`, `{{question}}`.
    pub user: String,
    /// System instruction for the follow-up engagement prompt.
    pub engagement_system: String,
    /// Variables: `{{timestamp}}`, `{{current_content}}`.
    pub engagement_user: String,
    /// System instruction for whole-video analysis. Must ask for JSON with
    /// `summary`, `outline` and `key_terms`.
    pub analysis_system: String,
    /// Variables: `{{transcript_text}}`.
    pub analysis_user: String,
    pub title_system: String,
    /// Variables: `{{first_question}}`.
    pub title_user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a teaching assistant helping a learner understand a training video.

Guidelines:
- Answer using the provided transcript context
- Cite the relevant timestamps, e.g. (1:05–1:40), when you use an excerpt
- If the context does not contain the answer, say so clearly instead of guessing
- Be concise but thorough"#
                .to_string(),

            user: r#"Video Transcript Context:
{{context}}

User Question: {{question}}

Please answer the question using the transcript context provided above. Reference specific timestamps when relevant."#
                .to_string(),

            engagement_system: r#"You write one short, friendly follow-up question that invites a learner to engage with what they are watching right now. Reply with the question only, under 100 characters."#
                .to_string(),

            engagement_user: r#"The learner is at {{timestamp}} seconds in the video. The current content is:

{{current_content}}

Write the follow-up question."#
                .to_string(),

            analysis_system: r#"You are an expert content analyst for training videos. Analyze the video transcript and provide:

1. Summary: A concise 2-3 sentence overview of the main topics and takeaways
2. Outline: The key sections, as a JSON array of objects with "timestamp" and "topic"
3. Key terms: Important technical terms and concepts covered, as a JSON array of strings

Return valid JSON with exactly these keys: "summary", "outline", "key_terms"."#
                .to_string(),

            analysis_user: "Analyze this video transcript:\n\n{{transcript_text}}".to_string(),

            title_system: r#"Generate a concise, descriptive title (max 50 characters) for a chat conversation based on the first question. Return only the title, no quotes or extra text."#
                .to_string(),

            title_user: "First question: {{first_question}}\n\nGenerate a title:".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts with an optional custom directory and custom variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render with both provided and configured variables; provided ones win.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        merged.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.user.contains("{{context}}"));
        assert!(prompts.rag.user.contains("{{question}}"));
        assert!(prompts.rag.engagement_user.contains("{{current_content}}"));
        assert!(prompts.rag.analysis_user.contains("{{transcript_text}}"));
        assert!(prompts.rag.title_user.contains("{{first_question}}"));
    }

    #[test]
    fn test_render_prefers_provided_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("course".to_string(), "Rust 101".to_string());
        prompts.variables.insert("question".to_string(), "from config".to_string());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is a lifetime?".to_string());

        let rendered = prompts.render_with_custom("{{course}}: {{question}}", &vars);
        assert_eq!(rendered, "Rust 101: What is a lifetime?");
    }

    #[test]
    fn test_load_custom_rag_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"Answer like a pirate.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "Answer like a pirate.");
        // Unspecified fields fall back to defaults.
        assert!(prompts.rag.user.contains("{{question}}"));
    }
}
