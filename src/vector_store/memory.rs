//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_distance, sort_by_distance, CollectionInfo, IndexedPoint, KnowledgeRecord,
    KnowledgeStore, RetrievalResult, SchemaStatus, VectorIndex,
};
use crate::error::{CuebaseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;
use uuid::Uuid;

struct Collection {
    dimension: usize,
    points: HashMap<Uuid, IndexedPoint>,
}

impl Collection {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: HashMap::new(),
        }
    }

    fn info(&self, video_id: &str) -> CollectionInfo {
        CollectionInfo {
            video_id: video_id.to_string(),
            chunk_count: self.points.len(),
            dimension: Some(self.dimension),
            exists: !self.points.is_empty(),
        }
    }
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    records: RwLock<HashMap<String, KnowledgeRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorStore {
    async fn ensure_schema(&self, video_id: &str, dimension: usize) -> Result<SchemaStatus> {
        let mut collections = self.write()?;

        match collections.get(video_id).map(|c| c.dimension) {
            Some(current) if current == dimension => Ok(SchemaStatus::Unchanged),
            Some(current) => {
                warn!(
                    "Recreating collection for video {} due to dimension mismatch (current={} expected={})",
                    video_id, current, dimension
                );
                collections.insert(video_id.to_string(), Collection::new(dimension));
                Ok(SchemaStatus::Recreated { previous: current })
            }
            None => {
                collections.insert(video_id.to_string(), Collection::new(dimension));
                Ok(SchemaStatus::Created)
            }
        }
    }

    async fn upsert(&self, points: &[IndexedPoint]) -> Result<Vec<Uuid>> {
        let mut collections = self.write()?;

        // Validate the whole batch before writing any of it. A new collection
        // takes the dimension of its first point.
        let mut batch_dims: HashMap<&str, usize> = HashMap::new();
        for point in points {
            let expected = match collections.get(&point.video_id) {
                Some(c) => c.dimension,
                None => *batch_dims
                    .entry(point.video_id.as_str())
                    .or_insert(point.vector.len()),
            };
            if point.vector.len() != expected {
                return Err(CuebaseError::DimensionMismatch {
                    expected,
                    actual: point.vector.len(),
                });
            }
        }

        for point in points {
            collections
                .entry(point.video_id.clone())
                .or_insert_with(|| Collection::new(point.vector.len()))
                .points
                .insert(point.id, point.clone());
        }

        Ok(points.iter().map(|p| p.id).collect())
    }

    async fn search(&self, video_id: &str, query: &[f32], limit: usize) -> Result<Vec<RetrievalResult>> {
        let collections = self.read()?;

        let Some(collection) = collections.get(video_id) else {
            return Ok(Vec::new());
        };

        if query.len() != collection.dimension {
            return Err(CuebaseError::DimensionMismatch {
                expected: collection.dimension,
                actual: query.len(),
            });
        }

        let mut results: Vec<RetrievalResult> = collection
            .points
            .values()
            .map(|p| RetrievalResult::from_point(p, cosine_distance(query, &p.vector)))
            .collect();

        sort_by_distance(&mut results);
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize> {
        let mut collections = self.write()?;

        let removed = collections
            .values_mut()
            .map(|c| ids.iter().filter(|id| c.points.remove(*id).is_some()).count())
            .sum();

        Ok(removed)
    }

    async fn drop_collection(&self, video_id: &str) -> Result<bool> {
        Ok(self.write()?.remove(video_id).is_some())
    }

    async fn get_all(&self, video_id: &str) -> Result<Vec<RetrievalResult>> {
        let collections = self.read()?;

        let mut results: Vec<RetrievalResult> = collections
            .get(video_id)
            .map(|c| {
                c.points
                    .values()
                    .map(|p| RetrievalResult::from_point(p, 0.0))
                    .collect()
            })
            .unwrap_or_default();

        results.sort_by_key(|r| r.metadata.sequence_index);
        Ok(results)
    }

    async fn collection_info(&self, video_id: &str) -> Result<CollectionInfo> {
        let collections = self.read()?;
        Ok(collections
            .get(video_id)
            .map(|c| c.info(video_id))
            .unwrap_or_else(|| CollectionInfo::missing(video_id)))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let collections = self.read()?;
        let mut infos: Vec<CollectionInfo> = collections
            .iter()
            .map(|(video_id, c)| c.info(video_id))
            .collect();
        infos.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(infos)
    }
}

#[async_trait]
impl KnowledgeStore for MemoryVectorStore {
    async fn put_record(&self, record: &KnowledgeRecord) -> Result<()> {
        self.records
            .write()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .insert(record.video_id.clone(), record.clone());
        Ok(())
    }

    async fn get_record(&self, video_id: &str) -> Result<Option<KnowledgeRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .get(video_id)
            .cloned())
    }

    async fn delete_record(&self, video_id: &str) -> Result<bool> {
        Ok(self
            .records
            .write()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .remove(video_id)
            .is_some())
    }

    async fn list_records(&self) -> Result<Vec<KnowledgeRecord>> {
        let mut records: Vec<KnowledgeRecord> = self
            .records
            .read()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }
}
