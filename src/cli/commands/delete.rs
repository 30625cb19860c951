//! Delete command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the delete command.
pub async fn run_delete(video_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.delete_video(video_id).await {
        Ok(removed) => {
            Output::success(&format!("Deleted '{}' ({} chunks)", video_id, removed));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to delete '{}': {}", video_id, e));
            Output::info("Use 'cuebase list' to see ingested videos.");
            Err(e.into())
        }
    }
}
