//! Chunking of caption segments into retrievable windows.
//!
//! A chunk merges several consecutive segments so each indexed unit carries
//! enough context to be useful on its own.

mod window;

pub use window::WindowChunker;

use crate::captions::{format_clock, TranscriptSegment};
use crate::error::{CuebaseError, Result};
use serde::{Deserialize, Serialize};

/// A merged window of consecutive segments, the unit that gets indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within its video, contiguous from 0.
    pub sequence_index: u32,
    /// Start time of the first segment in the window.
    pub start_seconds: f64,
    /// End time of the last segment in the window.
    pub end_seconds: f64,
    /// Segment texts joined with spaces.
    pub text: String,
}

impl Chunk {
    /// Build a chunk from a non-empty window of segments.
    pub fn from_window(sequence_index: u32, window: &[TranscriptSegment]) -> Option<Self> {
        let first = window.first()?;
        let last = window.last()?;

        Some(Self {
            sequence_index,
            start_seconds: first.start_seconds,
            end_seconds: last.end_seconds,
            text: window
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        })
    }

    /// Time range formatted as `m:ss–m:ss`.
    pub fn time_range(&self) -> String {
        format!("{}–{}", format_clock(self.start_seconds), format_clock(self.end_seconds))
    }
}

/// Configuration for window chunking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Number of segments per chunk.
    pub chunk_size: usize,
    /// Number of segments shared by consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            overlap: 1,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Check `chunk_size >= 1` and `overlap < chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CuebaseError::InvalidInput(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(CuebaseError::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive windows.
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}
