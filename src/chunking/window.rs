//! Sliding-window chunking.
//!
//! Windows of `chunk_size` segments advance by `chunk_size - overlap`, so
//! neighbouring chunks share `overlap` segments at their boundary.

use super::{Chunk, ChunkingConfig};
use crate::captions::TranscriptSegment;
use crate::error::Result;
use tracing::{debug, info, warn};

/// Segment-count based chunker.
#[derive(Debug, Clone, Default)]
pub struct WindowChunker {
    config: ChunkingConfig,
}

impl WindowChunker {
    /// Create a chunker, rejecting configurations where `overlap >= chunk_size`.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split ordered segments into overlapping chunks.
    ///
    /// Every window start `0, stride, 2*stride, ...` below the segment count
    /// yields one chunk, including a trailing partial window.
    pub fn chunk(&self, segments: &[TranscriptSegment]) -> Vec<Chunk> {
        let stride = self.config.stride();

        debug!(
            "Chunking {} segments with chunk_size={}, overlap={}",
            segments.len(),
            self.config.chunk_size,
            self.config.overlap
        );

        let chunks: Vec<Chunk> = (0..segments.len())
            .step_by(stride)
            .enumerate()
            .filter_map(|(order, start)| {
                let end = (start + self.config.chunk_size).min(segments.len());
                Chunk::from_window(order as u32, &segments[start..end])
            })
            .collect();

        if chunks.is_empty() {
            warn!("No chunks were created");
        } else {
            info!("Created {} chunks", chunks.len());
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(n: usize) -> Vec<TranscriptSegment> {
        (0..n)
            .map(|i| {
                let start = i as f64 * 5.0;
                TranscriptSegment::new(start, start + 4.0, format!("s{}", i))
            })
            .collect()
    }

    #[test]
    fn test_twelve_segments_make_three_chunks() {
        let chunker = WindowChunker::default();
        let chunks = chunker.chunk(&segments(12));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "s0 s1 s2 s3 s4");
        assert_eq!(chunks[1].text, "s4 s5 s6 s7 s8");
        assert_eq!(chunks[2].text, "s8 s9 s10 s11");
    }

    #[test]
    fn test_chunk_count_matches_ceiling_formula() {
        for (size, overlap) in [(5, 1), (3, 0), (4, 2), (1, 0)] {
            let chunker = WindowChunker::new(ChunkingConfig::new(size, overlap).unwrap()).unwrap();
            let stride = size - overlap;
            for n in 0..20usize {
                let expected = n.div_ceil(stride);
                assert_eq!(chunker.chunk(&segments(n)).len(), expected, "n={} size={} overlap={}", n, size, overlap);
            }
        }
    }

    #[test]
    fn test_chunk_bounds_and_sequence() {
        let segs = segments(10);
        let chunker = WindowChunker::new(ChunkingConfig::new(4, 1).unwrap()).unwrap();
        let chunks = chunker.chunk(&segs);

        for (i, chunk) in chunks.iter().enumerate() {
            let start = i * 3;
            let end = (start + 4).min(segs.len());
            assert_eq!(chunk.sequence_index, i as u32);
            assert_eq!(chunk.start_seconds, segs[start].start_seconds);
            assert_eq!(chunk.end_seconds, segs[end - 1].end_seconds);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(WindowChunker::default().chunk(&[]).is_empty());
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let config = ChunkingConfig { chunk_size: 2, overlap: 2 };
        assert!(WindowChunker::new(config).is_err());
    }
}
