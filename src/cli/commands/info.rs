//! Info command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the info command.
pub async fn run_info(video_id: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let info = orchestrator.collection_info(video_id).await?;
    let record = orchestrator.knowledge_record(video_id).await?;

    Output::header(&format!("Video {}", video_id));
    Output::kv("Indexed", if info.exists { "yes" } else { "no" });
    Output::kv("Chunks", &info.chunk_count.to_string());
    Output::kv(
        "Dimension",
        &info.dimension.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
    );

    match record {
        Some(record) => {
            Output::kv("Status", record.status.as_str());
            Output::kv("Updated", &record.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
            if let Some(error) = &record.error {
                Output::kv("Last error", error);
            }
        }
        None => Output::kv("Status", "not ingested"),
    }

    Ok(())
}
