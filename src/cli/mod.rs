//! CLI module for Cuebase.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Cuebase - ask questions about training videos
///
/// Indexes WebVTT caption tracks and answers questions grounded in what the
/// video says, optionally anchored at the current playback position.
#[derive(Parser, Debug)]
#[command(name = "cuebase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CUEBASE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a caption file for a video
    Ingest {
        /// Video ID the captions belong to
        video_id: String,

        /// WebVTT caption file ('-' reads stdin)
        file: String,

        /// Keep previously indexed chunks instead of replacing them
        #[arg(long)]
        keep_existing: bool,
    },

    /// Ask a question about a video
    Ask {
        /// Video ID to ask about
        video_id: String,

        /// The question to ask
        question: String,

        /// Current playback position in seconds
        #[arg(long, value_name = "SECONDS")]
        at: Option<f64>,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Summarize a video: overview, outline and key terms
    Analyze {
        /// Video ID
        video_id: String,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index details for a video
    Info {
        /// Video ID
        video_id: String,
    },

    /// Remove a video from the index
    Delete {
        /// Video ID
        video_id: String,
    },

    /// List ingested videos
    List,

    /// Rebuild a video's index from its stored captions
    Reingest {
        /// Video ID to rebuild (use 'all' to rebuild everything)
        video_id: String,
    },

    /// Export the stored transcript of a video
    Export {
        /// Video ID to export
        video_id: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (json, srt, vtt)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_timestamp() {
        let cli = Cli::try_parse_from(["cuebase", "-vv", "ask", "vid-1", "What is a trait?", "--at", "65.5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { video_id, question, at, model } => {
                assert_eq!(video_id, "vid-1");
                assert_eq!(question, "What is a trait?");
                assert_eq!(at, Some(65.5));
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_analyze_json() {
        let cli = Cli::try_parse_from(["cuebase", "analyze", "vid-1", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Analyze { ref video_id, json: true } if video_id == "vid-1"
        ));
    }

    #[test]
    fn test_parse_ingest_flags() {
        let cli = Cli::try_parse_from(["cuebase", "ingest", "vid-1", "talk.vtt", "--keep-existing"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ingest { keep_existing: true, .. }
        ));
    }
}
