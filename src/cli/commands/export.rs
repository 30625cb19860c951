//! Export command implementation.

use crate::captions::{format_segments, ExportFormat};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the export command.
pub async fn run_export(
    video_id: &str,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let export_format: ExportFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let orchestrator = Orchestrator::new(settings)?;

    let transcript = match orchestrator.transcript(video_id).await {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::error(&format!("No stored captions for video ID {}: {}", video_id, e));
            Output::info("Use 'cuebase list' to see ingested videos.");
            return Err(e.into());
        }
    };

    let output_str = format_segments(video_id, &transcript.segments, export_format);

    match output {
        Some(path) if path != "-" => {
            std::fs::write(&path, &output_str)?;
            Output::success(&format!(
                "Exported '{}' to {} ({} segments)",
                video_id,
                path,
                transcript.segments.len()
            ));
        }
        _ => {
            println!("{}", output_str);
        }
    }

    Ok(())
}
