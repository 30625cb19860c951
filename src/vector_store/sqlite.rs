//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine distance computed in Rust. Each video's
//! collection is a row in `collections` that pins its vector dimension.

use super::{
    cosine_distance, sort_by_distance, ChunkMetadata, CollectionInfo, IndexedPoint,
    KnowledgeRecord, KnowledgeStore, RetrievalResult, SchemaStatus, VectorIndex,
};
use crate::error::{CuebaseError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        video_id TEXT PRIMARY KEY,
        dimension INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS points (
        id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        sequence_index INTEGER NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        text TEXT NOT NULL,
        vector BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_points_video_id ON points(video_id);

    CREATE TABLE IF NOT EXISTS knowledge_records (
        video_id TEXT PRIMARY KEY,
        raw_payload TEXT NOT NULL,
        vector_ids TEXT NOT NULL,
        chunk_count INTEGER NOT NULL,
        status TEXT NOT NULL,
        error TEXT,
        updated_at TEXT NOT NULL
    );
"#;

const POINT_COLUMNS: &str = "id, sequence_index, start_seconds, end_seconds, text, vector";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CuebaseError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
        vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_uuid(value: &str) -> Result<Uuid> {
        Uuid::parse_str(value)
            .map_err(|e| CuebaseError::VectorStore(format!("Corrupt point id {}: {}", value, e)))
    }

    fn parse_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn dimension_of(conn: &Connection, video_id: &str) -> Result<Option<usize>> {
        let dimension: Option<i64> = conn
            .query_row(
                "SELECT dimension FROM collections WHERE video_id = ?1",
                params![video_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(dimension.map(|d| d as usize))
    }

    fn point_count(conn: &Connection, video_id: &str) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM points WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn create_collection(conn: &Connection, video_id: &str, dimension: usize) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO collections (video_id, dimension, created_at) VALUES (?1, ?2, ?3)",
            params![video_id, dimension as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn info_for(conn: &Connection, video_id: &str) -> Result<CollectionInfo> {
        let Some(dimension) = Self::dimension_of(conn, video_id)? else {
            return Ok(CollectionInfo::missing(video_id));
        };
        let chunk_count = Self::point_count(conn, video_id)?;

        Ok(CollectionInfo {
            video_id: video_id.to_string(),
            chunk_count,
            dimension: Some(dimension),
            exists: chunk_count > 0,
        })
    }

    /// Load a video's points as `(id, metadata, text, vector)` rows.
    fn load_points(conn: &Connection, video_id: &str) -> Result<Vec<(RetrievalResult, Vec<f32>)>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM points WHERE video_id = ?1 ORDER BY sequence_index",
            POINT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![video_id], |row: &Row<'_>| {
            let id: String = row.get(0)?;
            let vector: Vec<u8> = row.get(5)?;
            Ok((
                id,
                ChunkMetadata {
                    sequence_index: row.get(1)?,
                    start_seconds: row.get(2)?,
                    end_seconds: row.get(3)?,
                },
                row.get::<_, String>(4)?,
                vector,
            ))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (id, metadata, text, vector) = row?;
            points.push((
                RetrievalResult {
                    id: Self::parse_uuid(&id)?,
                    text,
                    metadata,
                    distance: 0.0,
                },
                Self::bytes_to_vector(&vector),
            ));
        }
        Ok(points)
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(KnowledgeRecord, String, String)> {
        let vector_ids: String = row.get(2)?;
        let status: String = row.get(4)?;
        let updated_at: String = row.get(6)?;
        let chunk_count: i64 = row.get(3)?;

        Ok((
            KnowledgeRecord {
                video_id: row.get(0)?,
                raw_payload: row.get(1)?,
                vector_ids: Vec::new(),
                chunk_count: chunk_count as usize,
                status: Default::default(),
                error: row.get(5)?,
                updated_at: Self::parse_time(&updated_at),
            },
            vector_ids,
            status,
        ))
    }

    fn finish_record(
        (mut record, vector_ids, status): (KnowledgeRecord, String, String),
    ) -> Result<KnowledgeRecord> {
        record.vector_ids = serde_json::from_str(&vector_ids)?;
        record.status = status.parse().map_err(CuebaseError::VectorStore)?;
        Ok(record)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorStore {
    #[instrument(skip(self))]
    async fn ensure_schema(&self, video_id: &str, dimension: usize) -> Result<SchemaStatus> {
        let conn = self.lock()?;

        match Self::dimension_of(&conn, video_id)? {
            Some(current) if current == dimension => Ok(SchemaStatus::Unchanged),
            Some(current) => {
                warn!(
                    "Recreating collection for video {} due to dimension mismatch (current={} expected={})",
                    video_id, current, dimension
                );
                let tx = conn.unchecked_transaction()?;
                tx.execute("DELETE FROM points WHERE video_id = ?1", params![video_id])?;
                Self::create_collection(&tx, video_id, dimension)?;
                tx.commit()?;
                Ok(SchemaStatus::Recreated { previous: current })
            }
            None => {
                Self::create_collection(&conn, video_id, dimension)?;
                debug!("Created collection for video {} (dimension={})", video_id, dimension);
                Ok(SchemaStatus::Created)
            }
        }
    }

    #[instrument(skip(self, points), fields(count = points.len()))]
    async fn upsert(&self, points: &[IndexedPoint]) -> Result<Vec<Uuid>> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for point in points {
            match Self::dimension_of(&tx, &point.video_id)? {
                Some(expected) if expected != point.vector.len() => {
                    return Err(CuebaseError::DimensionMismatch {
                        expected,
                        actual: point.vector.len(),
                    });
                }
                Some(_) => {}
                None => Self::create_collection(&tx, &point.video_id, point.vector.len())?,
            }

            let metadata = &point.payload.metadata;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO points
                (id, video_id, sequence_index, start_seconds, end_seconds, text, vector, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    point.id.to_string(),
                    point.video_id,
                    metadata.sequence_index,
                    metadata.start_seconds,
                    metadata.end_seconds,
                    point.payload.text,
                    Self::vector_to_bytes(&point.vector),
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }

        // Dropping the transaction on an early return rolls the batch back.
        tx.commit()?;
        info!("Upserted {} points", points.len());
        Ok(points.iter().map(|p| p.id).collect())
    }

    #[instrument(skip(self, query))]
    async fn search(&self, video_id: &str, query: &[f32], limit: usize) -> Result<Vec<RetrievalResult>> {
        let conn = self.lock()?;

        let Some(dimension) = Self::dimension_of(&conn, video_id)? else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(CuebaseError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let mut results: Vec<RetrievalResult> = Self::load_points(&conn, video_id)?
            .into_iter()
            .map(|(mut result, vector)| {
                result.distance = cosine_distance(query, &vector);
                result
            })
            .collect();

        sort_by_distance(&mut results);
        results.truncate(limit);

        debug!("Found {} matching points", results.len());
        Ok(results)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut deleted = 0;
        for id in ids {
            deleted += tx.execute("DELETE FROM points WHERE id = ?1", params![id.to_string()])?;
        }
        tx.commit()?;

        info!("Deleted {} points", deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn drop_collection(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM points WHERE video_id = ?1", params![video_id])?;
        let removed = tx.execute("DELETE FROM collections WHERE video_id = ?1", params![video_id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    async fn get_all(&self, video_id: &str) -> Result<Vec<RetrievalResult>> {
        let conn = self.lock()?;
        Ok(Self::load_points(&conn, video_id)?
            .into_iter()
            .map(|(result, _)| result)
            .collect())
    }

    async fn collection_info(&self, video_id: &str) -> Result<CollectionInfo> {
        let conn = self.lock()?;
        Self::info_for(&conn, video_id)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT video_id FROM collections ORDER BY video_id")?;
        let video_ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        video_ids
            .iter()
            .map(|video_id| Self::info_for(&conn, video_id))
            .collect()
    }
}

#[async_trait]
impl KnowledgeStore for SqliteVectorStore {
    #[instrument(skip(self, record), fields(video_id = %record.video_id))]
    async fn put_record(&self, record: &KnowledgeRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO knowledge_records
            (video_id, raw_payload, vector_ids, chunk_count, status, error, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.video_id,
                record.raw_payload,
                serde_json::to_string(&record.vector_ids)?,
                record.chunk_count as i64,
                record.status.as_str(),
                record.error,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn get_record(&self, video_id: &str) -> Result<Option<KnowledgeRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                r#"
                SELECT video_id, raw_payload, vector_ids, chunk_count, status, error, updated_at
                FROM knowledge_records WHERE video_id = ?1
                "#,
                params![video_id],
                Self::record_from_row,
            )
            .optional()?;

        row.map(Self::finish_record).transpose()
    }

    async fn delete_record(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM knowledge_records WHERE video_id = ?1",
            params![video_id],
        )?;
        Ok(deleted > 0)
    }

    async fn list_records(&self) -> Result<Vec<KnowledgeRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, raw_payload, vector_ids, chunk_count, status, error, updated_at
            FROM knowledge_records
            ORDER BY updated_at DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], Self::record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(Self::finish_record).collect()
    }
}
