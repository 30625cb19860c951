//! Knowledge records: what was ingested for a video and which vector ids it
//! produced.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a video's ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorizationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl VectorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorizationStatus::Pending => "pending",
            VectorizationStatus::Processing => "processing",
            VectorizationStatus::Completed => "completed",
            VectorizationStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for VectorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VectorizationStatus::Pending),
            "processing" => Ok(VectorizationStatus::Processing),
            "completed" => Ok(VectorizationStatus::Completed),
            "failed" => Ok(VectorizationStatus::Failed),
            _ => Err(format!("Unknown vectorization status: {}", s)),
        }
    }
}

impl std::fmt::Display for VectorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingestion state for one video.
///
/// After every successful ingest or delete, `vector_ids` matches the ids
/// present in the video's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub video_id: String,
    /// The raw caption text that was ingested.
    pub raw_payload: String,
    pub vector_ids: Vec<Uuid>,
    pub chunk_count: usize,
    pub status: VectorizationStatus,
    /// Failure message when `status` is `Failed`.
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeRecord {
    /// A record for captions that are about to be processed.
    pub fn processing(video_id: &str, raw_payload: &str, vector_ids: Vec<Uuid>) -> Self {
        Self {
            video_id: video_id.to_string(),
            raw_payload: raw_payload.to_string(),
            chunk_count: vector_ids.len(),
            vector_ids,
            status: VectorizationStatus::Processing,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn complete(mut self, vector_ids: Vec<Uuid>) -> Self {
        self.chunk_count = vector_ids.len();
        self.vector_ids = vector_ids;
        self.status = VectorizationStatus::Completed;
        self.error = None;
        self.updated_at = Utc::now();
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = VectorizationStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        self
    }
}

/// Persistence for knowledge records.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert or replace the record for `record.video_id`.
    async fn put_record(&self, record: &KnowledgeRecord) -> Result<()>;

    async fn get_record(&self, video_id: &str) -> Result<Option<KnowledgeRecord>>;

    async fn delete_record(&self, video_id: &str) -> Result<bool>;

    /// All records, most recently updated first.
    async fn list_records(&self) -> Result<Vec<KnowledgeRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_transitions() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let record = KnowledgeRecord::processing("vid", "WEBVTT", Vec::new());
        assert_eq!(record.status, VectorizationStatus::Processing);

        let done = record.clone().complete(ids.clone());
        assert_eq!(done.status, VectorizationStatus::Completed);
        assert_eq!(done.chunk_count, 2);
        assert_eq!(done.vector_ids, ids);

        let failed = record.fail("provider down");
        assert_eq!(failed.status, VectorizationStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("provider down"));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            VectorizationStatus::Pending,
            VectorizationStatus::Processing,
            VectorizationStatus::Completed,
            VectorizationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<VectorizationStatus>().unwrap(), status);
        }
    }
}
