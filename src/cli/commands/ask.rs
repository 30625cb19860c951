//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    video_id: &str,
    question: &str,
    at: Option<f64>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Searching transcript...");

    match orchestrator.ask(video_id, question, at, &[]).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);
            Output::kv("Confidence", &format!("{}%", response.confidence_score));

            if let Some(prompt) = &response.context_prompt {
                Output::kv("Try next", prompt);
            }

            if !response.referenced_chunks.is_empty() {
                Output::header("Sources");
                for (i, chunk) in response.referenced_chunks.iter().enumerate() {
                    Output::excerpt(
                        i + 1,
                        chunk.metadata.start_seconds,
                        chunk.metadata.end_seconds,
                        chunk.distance,
                        &chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
