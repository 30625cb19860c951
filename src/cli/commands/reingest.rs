//! Reingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the reingest command.
pub async fn run_reingest(video_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    if video_id == "all" {
        let videos = orchestrator.list_videos().await?;

        if videos.is_empty() {
            Output::warning("No ingested videos found.");
            return Ok(());
        }

        Output::info(&format!("Found {} videos to rebuild", videos.len()));
        println!();

        let mut success_count = 0;
        let mut error_count = 0;

        for (i, video) in videos.iter().enumerate() {
            Output::info(&format!("[{}/{}] Rebuilding: {}", i + 1, videos.len(), video.video_id));

            match orchestrator.reingest(&video.video_id).await {
                Ok(outcome) => {
                    Output::success(&format!("  Rebuilt ({} chunks)", outcome.chunk_count));
                    success_count += 1;
                }
                Err(e) => {
                    Output::error(&format!("  Failed: {}", e));
                    error_count += 1;
                }
            }
        }

        println!();
        Output::info(&format!(
            "Rebuild complete: {} succeeded, {} failed",
            success_count, error_count
        ));
    } else {
        let spinner = Output::spinner(&format!("Rebuilding {}...", video_id));

        match orchestrator.reingest(video_id).await {
            Ok(outcome) => {
                spinner.finish_and_clear();
                Output::success(&format!(
                    "Rebuilt '{}' ({} chunks)",
                    outcome.video_id, outcome.chunk_count
                ));
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Failed to rebuild: {}", e));
                return Err(e.into());
            }
        }
    }

    Ok(())
}
