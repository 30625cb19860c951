//! Cuebase CLI entry point.

use anyhow::Result;
use clap::Parser;
use cuebase::cli::{commands, Cli, Commands};
use cuebase::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cuebase={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest {
            video_id,
            file,
            keep_existing,
        } => {
            commands::run_ingest(video_id, file, *keep_existing, settings).await?;
        }

        Commands::Ask {
            video_id,
            question,
            at,
            model,
        } => {
            commands::run_ask(video_id, question, *at, model.clone(), settings).await?;
        }

        Commands::Analyze { video_id, json } => {
            commands::run_analyze(video_id, *json, settings).await?;
        }

        Commands::Info { video_id } => {
            commands::run_info(video_id, settings).await?;
        }

        Commands::Delete { video_id } => {
            commands::run_delete(video_id, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Reingest { video_id } => {
            commands::run_reingest(video_id, settings).await?;
        }

        Commands::Export {
            video_id,
            output,
            format,
        } => {
            commands::run_export(video_id, output.clone(), format, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
