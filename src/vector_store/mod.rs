//! Vector index abstraction for Cuebase.
//!
//! Every video owns a logical collection with a fixed vector dimension.
//! Operations on one video's collection never see another video's points.

mod memory;
mod record;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use record::{KnowledgeRecord, KnowledgeStore, VectorizationStatus};
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timing and ordering metadata stored with each point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub sequence_index: u32,
}

/// Payload stored alongside a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A vector plus payload, one per chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub id: Uuid,
    pub video_id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl IndexedPoint {
    /// Create a point with a fresh id for a chunk of `video_id`.
    pub fn from_chunk(video_id: &str, chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id: video_id.to_string(),
            vector,
            payload: ChunkPayload {
                text: chunk.text.clone(),
                metadata: ChunkMetadata {
                    start_seconds: chunk.start_seconds,
                    end_seconds: chunk.end_seconds,
                    sequence_index: chunk.sequence_index,
                },
            },
        }
    }
}

/// A chunk returned from the index. Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: Uuid,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance in `[0, 2]`.
    pub distance: f32,
}

impl RetrievalResult {
    pub fn from_point(point: &IndexedPoint, distance: f32) -> Self {
        Self {
            id: point.id,
            text: point.payload.text.clone(),
            metadata: point.payload.metadata,
            distance,
        }
    }

    pub fn sequence_index(&self) -> u32 {
        self.metadata.sequence_index
    }

    /// Rebuild the chunk this result was indexed from.
    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            sequence_index: self.metadata.sequence_index,
            start_seconds: self.metadata.start_seconds,
            end_seconds: self.metadata.end_seconds,
            text: self.text.clone(),
        }
    }
}

/// Summary of one video's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub video_id: String,
    pub chunk_count: usize,
    /// Vector dimension, if the collection exists.
    pub dimension: Option<usize>,
    /// True when the collection holds at least one point.
    pub exists: bool,
}

impl CollectionInfo {
    pub fn missing(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            chunk_count: 0,
            dimension: None,
            exists: false,
        }
    }
}

/// What `ensure_schema` did to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    Unchanged,
    /// The collection had another dimension and was dropped and recreated.
    Recreated { previous: usize },
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Make sure `video_id` has a collection of `dimension`. A collection of
    /// another dimension is dropped with all of its points and recreated.
    async fn ensure_schema(&self, video_id: &str, dimension: usize) -> Result<SchemaStatus>;

    /// Insert or replace points by id, returning the ids written.
    ///
    /// A missing collection is created with the first point's dimension.
    async fn upsert(&self, points: &[IndexedPoint]) -> Result<Vec<Uuid>>;

    /// Up to `limit` closest points of one video, by ascending distance.
    async fn search(&self, video_id: &str, query: &[f32], limit: usize) -> Result<Vec<RetrievalResult>>;

    /// Remove points by id. Unknown ids are ignored.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize>;

    /// Remove a video's collection and all its points.
    async fn drop_collection(&self, video_id: &str) -> Result<bool>;

    /// Every point of one video ordered by sequence index, with distance 0.
    async fn get_all(&self, video_id: &str) -> Result<Vec<RetrievalResult>>;

    /// Point count and dimension for one video.
    async fn collection_info(&self, video_id: &str) -> Result<CollectionInfo>;

    /// Info for every collection.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance `1 - similarity`, clamped to `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).clamp(0.0, 2.0)
}

/// Order results by ascending distance, then by sequence index.
pub(crate) fn sort_by_distance(results: &mut [RetrievalResult]) {
    results.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.metadata.sequence_index.cmp(&b.metadata.sequence_index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_range() {
        let a = vec![1.0, 0.0];
        assert!(cosine_distance(&a, &[1.0, 0.0]).abs() < 0.001);
        assert!((cosine_distance(&a, &[0.0, 1.0]) - 1.0).abs() < 0.001);
        assert!((cosine_distance(&a, &[-1.0, 0.0]) - 2.0).abs() < 0.001);
        // Mismatched lengths are treated as unrelated.
        assert!((cosine_distance(&a, &[1.0]) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_point_from_chunk() {
        let chunk = Chunk {
            sequence_index: 3,
            start_seconds: 12.0,
            end_seconds: 20.5,
            text: "ownership rules".to_string(),
        };
        let point = IndexedPoint::from_chunk("vid-1", &chunk, vec![0.5; 4]);
        let result = RetrievalResult::from_point(&point, 0.25);

        assert_eq!(point.video_id, "vid-1");
        assert_eq!(result.sequence_index(), 3);
        assert_eq!(result.to_chunk(), chunk);
    }
}
