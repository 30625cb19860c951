//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{IngestOptions, Orchestrator};
use anyhow::{Context, Result};
use std::io::Read;

/// Run the ingest command.
pub async fn run_ingest(video_id: &str, file: &str, keep_existing: bool, settings: Settings) -> Result<()> {
    let captions = if file == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read captions from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read caption file {}", file))?
    };

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner(&format!("Indexing captions for {}...", video_id));

    let options = IngestOptions {
        clear_existing: !keep_existing,
    };

    match orchestrator.ingest(video_id, &captions, options).await {
        Ok(outcome) => {
            spinner.finish_and_clear();
            Output::success(&format!(
                "Indexed {} chunks for '{}' ({} vectors total)",
                outcome.chunk_count,
                outcome.video_id,
                outcome.vector_ids.len()
            ));

            if !outcome.skipped_cues.is_empty() {
                Output::warning(&format!("Skipped {} malformed cues:", outcome.skipped_cues.len()));
                for cue in &outcome.skipped_cues {
                    Output::kv(&format!("line {}", cue.line), &cue.reason.to_string());
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to ingest captions: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
