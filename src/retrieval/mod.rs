//! Retrieval for question answering.
//!
//! Combines chunks playing around the viewer's current timestamp with the
//! chunks most similar to the question.

use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::{CuebaseError, Result};
use crate::vector_store::{RetrievalResult, VectorIndex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Chunks selected for one question, with a confidence estimate.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Timestamp chunks first, then semantic matches. No repeated sequence
    /// indexes.
    pub chunks: Vec<RetrievalResult>,
    /// How many of `chunks` came from the timestamp window.
    pub context_count: usize,
    /// 0-100.
    pub confidence: u8,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Selects transcript chunks for a question.
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            index,
            embedder,
            settings,
        }
    }

    /// Retrieve chunks of `video_id` relevant to `question`, optionally
    /// anchored at `timestamp` seconds.
    #[instrument(skip(self, question))]
    pub async fn retrieve(
        &self,
        video_id: &str,
        question: &str,
        timestamp: Option<f64>,
    ) -> Result<Retrieval> {
        let context = match timestamp {
            Some(t) => {
                let all = self.index.get_all(video_id).await?;
                chunks_near_timestamp(
                    all,
                    t,
                    self.settings.window_seconds,
                    self.settings.max_context_chunks,
                )
            }
            None => Vec::new(),
        };

        let query = self.embedder.embed(question).await?;
        let semantic = match self
            .index
            .search(video_id, &query, self.settings.n_chunks)
            .await
        {
            Ok(results) => results,
            Err(CuebaseError::DimensionMismatch { expected, actual }) => {
                warn!(
                    "Query embedding has {} dimensions but video {} was indexed with {}; skipping semantic search",
                    actual, video_id, expected
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let context_count = context
            .iter()
            .map(|c| c.sequence_index())
            .collect::<HashSet<_>>()
            .len();
        let chunks = merge_results(context, semantic, self.settings.n_chunks * 2);
        let confidence = confidence_score(&chunks);

        debug!(
            "Retrieved {} chunks ({} from timestamp window), confidence {}",
            chunks.len(),
            context_count,
            confidence
        );

        Ok(Retrieval {
            chunks,
            context_count,
            confidence,
        })
    }
}

/// Chunks overlapping `[max(0, t - window), t + window]`, nearest start first.
pub fn chunks_near_timestamp(
    chunks: Vec<RetrievalResult>,
    timestamp: f64,
    window_seconds: f64,
    limit: usize,
) -> Vec<RetrievalResult> {
    let window_start = (timestamp - window_seconds).max(0.0);
    let window_end = timestamp + window_seconds;

    let mut nearby: Vec<RetrievalResult> = chunks
        .into_iter()
        .filter(|c| c.metadata.end_seconds >= window_start && c.metadata.start_seconds <= window_end)
        .map(|mut c| {
            c.distance = 0.0;
            c
        })
        .collect();

    nearby.sort_by(|a, b| {
        let da = (a.metadata.start_seconds - timestamp).abs();
        let db = (b.metadata.start_seconds - timestamp).abs();
        da.total_cmp(&db)
    });
    nearby.truncate(limit);
    nearby
}

/// Context chunks followed by unseen semantic chunks, up to `max_total`.
///
/// Context chunks are always kept.
pub fn merge_results(
    context: Vec<RetrievalResult>,
    semantic: Vec<RetrievalResult>,
    max_total: usize,
) -> Vec<RetrievalResult> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(context.len() + semantic.len());

    for chunk in context {
        if seen.insert(chunk.sequence_index()) {
            merged.push(chunk);
        }
    }

    for chunk in semantic {
        if merged.len() >= max_total {
            break;
        }
        if seen.insert(chunk.sequence_index()) {
            merged.push(chunk);
        }
    }

    merged
}

/// Confidence from mean cosine distance, with a bonus for broad support.
pub fn confidence_score(chunks: &[RetrievalResult]) -> u8 {
    if chunks.is_empty() {
        return 0;
    }

    let mean = chunks.iter().map(|c| c.distance as f64).sum::<f64>() / chunks.len() as f64;
    let mut score = ((1.0 - mean / 2.0) * 100.0).round().clamp(0.0, 100.0);

    if chunks.len() >= 3 {
        score = (score + 10.0).min(100.0);
    }

    score as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::embedding::HashEmbedder;
    use crate::vector_store::{IndexedPoint, MemoryVectorStore};

    fn result(index: u32, start: f64, end: f64, distance: f32) -> RetrievalResult {
        let chunk = Chunk {
            sequence_index: index,
            start_seconds: start,
            end_seconds: end,
            text: format!("chunk {}", index),
        };
        RetrievalResult::from_point(&IndexedPoint::from_chunk("vid", &chunk, vec![1.0]), distance)
    }

    #[test]
    fn test_timestamp_window() {
        let chunks = vec![
            result(0, 10.0, 20.0, 0.0),
            result(1, 40.0, 50.0, 0.0),
            result(2, 60.0, 70.0, 0.0),
            result(3, 100.0, 110.0, 0.0),
        ];

        let near = chunks_near_timestamp(chunks, 65.0, 30.0, 5);
        let order: Vec<u32> = near.iter().map(|c| c.sequence_index()).collect();
        // Window is [35, 95]: chunk 0 ends too early, chunk 3 starts too late.
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn test_timestamp_window_clamps_at_zero_and_caps() {
        let chunks: Vec<RetrievalResult> = (0..10)
            .map(|i| result(i, i as f64 * 3.0, i as f64 * 3.0 + 3.0, 0.4))
            .collect();

        let near = chunks_near_timestamp(chunks, 5.0, 30.0, 5);
        assert_eq!(near.len(), 5);
        assert_eq!(near[0].sequence_index(), 2);
        assert!(near.iter().all(|c| c.distance == 0.0));
    }

    #[test]
    fn test_merge_deduplicates_by_sequence() {
        let context = vec![result(2, 60.0, 70.0, 0.0), result(1, 40.0, 50.0, 0.0)];
        let semantic = vec![
            result(1, 40.0, 50.0, 0.1),
            result(5, 150.0, 160.0, 0.2),
            result(7, 200.0, 210.0, 0.3),
        ];

        let merged = merge_results(context, semantic, 3);
        let order: Vec<u32> = merged.iter().map(|c| c.sequence_index()).collect();
        assert_eq!(order, vec![2, 1, 5]);
        // The context copy wins over the semantic duplicate.
        assert_eq!(merged[1].distance, 0.0);
    }

    #[test]
    fn test_merge_never_repeats_sequence_indexes() {
        // Ingesting without clearing leaves two points per sequence index, so
        // both lists can carry repeats.
        for context_len in 0..4u32 {
            let mut context: Vec<RetrievalResult> = (0..context_len)
                .map(|i| result(i, i as f64 * 10.0, i as f64 * 10.0 + 10.0, 0.0))
                .collect();
            if context_len > 0 {
                context.push(result(0, 0.0, 10.0, 0.0));
            }

            for offset in 0..6u32 {
                let semantic: Vec<RetrievalResult> = (0..8u32)
                    .map(|i| result(offset + i / 2, 0.0, 1.0, 0.1 * i as f32))
                    .collect();

                for max_total in [0usize, 1, 3, 10] {
                    let merged = merge_results(context.clone(), semantic.clone(), max_total);
                    let order: Vec<u32> = merged.iter().map(|c| c.sequence_index()).collect();

                    let unique: HashSet<u32> = order.iter().copied().collect();
                    assert_eq!(unique.len(), order.len(), "repeat in {:?}", order);

                    let expected_context: Vec<u32> = (0..context_len).collect();
                    assert_eq!(&order[..context_len as usize], expected_context.as_slice());
                    assert!(order.len() <= max_total.max(context_len as usize));
                }
            }
        }
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(&[]), 0);
        assert_eq!(confidence_score(&[result(0, 0.0, 1.0, 0.0)]), 100);
        assert_eq!(confidence_score(&[result(0, 0.0, 1.0, 1.0)]), 50);
        assert_eq!(confidence_score(&[result(0, 0.0, 1.0, 2.0)]), 0);

        let three = [
            result(0, 0.0, 1.0, 1.0),
            result(1, 1.0, 2.0, 1.0),
            result(2, 2.0, 3.0, 1.0),
        ];
        assert_eq!(confidence_score(&three), 60);

        let perfect = [
            result(0, 0.0, 1.0, 0.0),
            result(1, 1.0, 2.0, 0.0),
            result(2, 2.0, 3.0, 0.0),
        ];
        assert_eq!(confidence_score(&perfect), 100);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_video_is_empty() {
        let index = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(HashEmbedder::new(16).unwrap());
        let retriever = Retriever::new(index, embedder, RetrievalSettings::default());

        let retrieval = retriever.retrieve("nope", "anything?", Some(12.0)).await.unwrap();
        assert!(retrieval.is_empty());
        assert_eq!(retrieval.confidence, 0);
    }

    #[tokio::test]
    async fn test_retrieve_survives_dimension_mismatch() {
        let index = Arc::new(MemoryVectorStore::new());
        let chunk = Chunk {
            sequence_index: 0,
            start_seconds: 0.0,
            end_seconds: 10.0,
            text: "intro".to_string(),
        };
        index
            .upsert(&[IndexedPoint::from_chunk("vid", &chunk, vec![1.0; 8])])
            .await
            .unwrap();

        let embedder = Arc::new(HashEmbedder::new(16).unwrap());
        let retriever = Retriever::new(index, embedder, RetrievalSettings::default());

        let without_time = retriever.retrieve("vid", "intro", None).await.unwrap();
        assert!(without_time.is_empty());

        let with_time = retriever.retrieve("vid", "intro", Some(5.0)).await.unwrap();
        assert_eq!(with_time.chunks.len(), 1);
        assert_eq!(with_time.context_count, 1);
        assert_eq!(with_time.confidence, 100);
    }
}
