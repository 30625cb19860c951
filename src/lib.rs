//! Cuebase - question answering over training-video captions
//!
//! Turns a video's WebVTT caption track into a searchable knowledge base and
//! answers learner questions grounded in what the video actually says.
//!
//! # Overview
//!
//! Cuebase allows you to:
//! - Parse caption tracks into ordered, time-stamped segments
//! - Group segments into overlapping chunks and index their embeddings per video
//! - Ask questions, optionally anchored at the current playback position
//! - Get answers with the referenced excerpts and a confidence score
//!
//! # Architecture
//!
//! - `captions` - WebVTT parsing and transcript export
//! - `chunking` - Sliding-window chunking
//! - `embedding` - Embedding generation (OpenAI or offline hash)
//! - `vector_store` - Per-video vector collections and knowledge records
//! - `retrieval` - Timestamp and semantic retrieval with confidence scoring
//! - `rag` - Prompt building and answer generation
//! - `orchestrator` - Pipeline coordination
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use cuebase::config::Settings;
//! use cuebase::orchestrator::{IngestOptions, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let captions = std::fs::read_to_string("lesson-01.vtt")?;
//!     let outcome = orchestrator
//!         .ingest("lesson-01", &captions, IngestOptions::default())
//!         .await?;
//!     println!("Indexed {} chunks", outcome.chunk_count);
//!
//!     let response = orchestrator
//!         .ask("lesson-01", "What is a lifetime?", Some(95.0), &[])
//!         .await?;
//!     println!("{} ({}%)", response.answer, response.confidence_score);
//!
//!     Ok(())
//! }
//! ```

pub mod captions;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod vector_store;

pub use error::{CuebaseError, Result};
