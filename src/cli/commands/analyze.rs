//! Analyze command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the analyze command.
pub async fn run_analyze(video_id: &str, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Analyzing video {}...", video_id));
    let analysis = orchestrator.analyze(video_id).await;
    spinner.finish_and_clear();

    let analysis = match analysis {
        Ok(analysis) => analysis,
        Err(e) => {
            Output::error(&format!("Analysis failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    Output::header(&format!("Video {}", video_id));
    println!("{}", analysis.summary);

    if !analysis.outline.is_empty() {
        println!();
        Output::header("Outline");
        for entry in &analysis.outline {
            Output::kv(&entry.timestamp, &entry.topic);
        }
    }

    if !analysis.key_terms.is_empty() {
        println!();
        Output::kv("Key terms", &analysis.key_terms.join(", "));
    }

    Ok(())
}
