//! Pipeline orchestrator for Cuebase.
//!
//! Coordinates caption ingestion (parse, chunk, embed, index) and question
//! answering (retrieve, compose) for one video at a time.

use crate::captions::{parse_captions, SkippedCue, Transcript};
use crate::chunking::WindowChunker;
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{CuebaseError, Result};
use crate::rag::{
    AnswerComposer, ChatMessage, ContentAnalyzer, Generator, OpenAIGenerator, VideoAnalysis,
};
use crate::retrieval::Retriever;
use crate::vector_store::{
    CollectionInfo, IndexedPoint, KnowledgeRecord, KnowledgeStore, MemoryVectorStore,
    RetrievalResult, SchemaStatus, SqliteVectorStore, VectorIndex,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Options for [`Orchestrator::ingest`].
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Remove the video's previously indexed chunks before writing new ones.
    pub clear_existing: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            clear_existing: true,
        }
    }
}

/// Result of ingesting a caption track.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub video_id: String,
    /// Number of chunks written by this ingestion.
    pub chunk_count: usize,
    /// Ids of every point the video now has in the index.
    pub vector_ids: Vec<Uuid>,
    pub skipped_cues: Vec<SkippedCue>,
}

/// Answer to a question about one video.
#[derive(Debug, Clone)]
pub struct AskResponse {
    pub answer: String,
    pub referenced_chunks: Vec<RetrievalResult>,
    /// 0-100.
    pub confidence_score: u8,
    pub context_prompt: Option<String>,
}

/// The main orchestrator for the Cuebase pipeline.
pub struct Orchestrator {
    chunker: WindowChunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    records: Arc<dyn KnowledgeStore>,
    retriever: Retriever,
    composer: AnswerComposer,
    analyzer: ContentAnalyzer,
}

impl Orchestrator {
    /// Create an orchestrator from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = create_embedder(&settings.embedding, settings.openai.timeout_secs)?;
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(settings.openai.timeout_secs)?);

        let (index, records): (Arc<dyn VectorIndex>, Arc<dyn KnowledgeStore>) =
            match settings.vector_store.provider.as_str() {
                "sqlite" => {
                    let store = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
                    (store.clone() as Arc<dyn VectorIndex>, store as Arc<dyn KnowledgeStore>)
                }
                "memory" => {
                    let store = Arc::new(MemoryVectorStore::new());
                    (store.clone() as Arc<dyn VectorIndex>, store as Arc<dyn KnowledgeStore>)
                }
                other => {
                    return Err(CuebaseError::Config(format!(
                        "Unknown vector store provider: {} (expected sqlite or memory)",
                        other
                    )))
                }
            };

        Self::with_components(settings, prompts, embedder, index, records, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        records: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let chunker = WindowChunker::new(settings.chunking.to_config())?;
        let retriever = Retriever::new(index.clone(), embedder.clone(), settings.retrieval.clone());
        let composer =
            AnswerComposer::new(generator.clone(), settings.rag.clone()).with_prompts(prompts.clone());
        let analyzer = ContentAnalyzer::new(generator, settings.rag.clone()).with_prompts(prompts);

        Ok(Self {
            chunker,
            embedder,
            index,
            records,
            retriever,
            composer,
            analyzer,
        })
    }

    /// Parse, chunk, embed and index a caption track for `video_id`.
    ///
    /// The knowledge record is marked `Failed` when any step fails. Its
    /// vector ids always reflect what the index holds afterwards, and a failed
    /// ingestion keeps the previously stored captions.
    #[instrument(skip(self, raw_captions))]
    pub async fn ingest(
        &self,
        video_id: &str,
        raw_captions: &str,
        options: IngestOptions,
    ) -> Result<IngestOutcome> {
        validate_video_id(video_id)?;

        let previous = self.records.get_record(video_id).await?;
        let previous_ids = previous
            .as_ref()
            .map(|r| r.vector_ids.clone())
            .unwrap_or_default();

        let record = KnowledgeRecord::processing(video_id, raw_captions, previous_ids.clone());
        self.records.put_record(&record).await?;

        let result = self
            .index_captions(video_id, raw_captions, options, &previous_ids)
            .await;

        match result {
            Ok(outcome) => {
                self.records
                    .put_record(&record.complete(outcome.vector_ids.clone()))
                    .await?;
                info!(
                    "Ingested {} chunks for video {} ({} cues skipped)",
                    outcome.chunk_count,
                    video_id,
                    outcome.skipped_cues.len()
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!("Ingestion failed for video {}: {}", video_id, e);
                let present = match self.index.get_all(video_id).await {
                    Ok(points) => points.into_iter().map(|p| p.id).collect(),
                    Err(_) => previous_ids,
                };
                let mut failed = previous.unwrap_or(record).fail(e.to_string());
                failed.chunk_count = present.len();
                failed.vector_ids = present;
                self.records.put_record(&failed).await?;
                Err(e)
            }
        }
    }

    async fn index_captions(
        &self,
        video_id: &str,
        raw_captions: &str,
        options: IngestOptions,
        previous_ids: &[Uuid],
    ) -> Result<IngestOutcome> {
        let report = parse_captions(raw_captions)?;
        let chunks = self.chunker.chunk(&report.segments);
        debug!("Split {} segments into {} chunks", report.segments.len(), chunks.len());

        // Embed first: a provider failure must leave the previous version in place.
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(CuebaseError::Provider(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        if options.clear_existing {
            self.index.drop_collection(video_id).await?;
        }
        let schema = self
            .index
            .ensure_schema(video_id, self.embedder.dimensions())
            .await?;

        // A recreated collection no longer holds the previous points.
        let keep_previous =
            !options.clear_existing && !matches!(schema, SchemaStatus::Recreated { .. });
        if !options.clear_existing && !keep_previous {
            warn!(
                "Collection for video {} was recreated; {} previous chunks were dropped",
                video_id,
                previous_ids.len()
            );
        }

        let points: Vec<IndexedPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedPoint::from_chunk(video_id, chunk, vector))
            .collect();
        let written = self.index.upsert(&points).await?;

        let vector_ids = if keep_previous {
            previous_ids.iter().chain(written.iter()).copied().collect()
        } else {
            written.clone()
        };

        Ok(IngestOutcome {
            video_id: video_id.to_string(),
            chunk_count: written.len(),
            vector_ids,
            skipped_cues: report.skipped,
        })
    }

    /// Answer a question about `video_id`, optionally anchored at a playback
    /// position in seconds.
    #[instrument(skip(self, question, history))]
    pub async fn ask(
        &self,
        video_id: &str,
        question: &str,
        timestamp: Option<f64>,
        history: &[ChatMessage],
    ) -> Result<AskResponse> {
        validate_video_id(video_id)?;
        if question.trim().is_empty() {
            return Err(CuebaseError::InvalidInput("Question must not be empty".to_string()));
        }
        if let Some(t) = timestamp {
            if !t.is_finite() || t < 0.0 {
                return Err(CuebaseError::InvalidInput(format!(
                    "Timestamp must be a non-negative number of seconds, got {}",
                    t
                )));
            }
        }

        let retrieval = self.retriever.retrieve(video_id, question, timestamp).await?;
        let composed = self
            .composer
            .compose(
                &retrieval.chunks,
                retrieval.context_count,
                question,
                history,
                timestamp,
            )
            .await?;

        Ok(AskResponse {
            answer: composed.answer,
            referenced_chunks: composed.referenced_chunks,
            confidence_score: retrieval.confidence,
            context_prompt: composed.context_prompt,
        })
    }

    /// Point count and dimension of a video's collection.
    pub async fn collection_info(&self, video_id: &str) -> Result<CollectionInfo> {
        self.index.collection_info(video_id).await
    }

    /// Remove a video's chunks and knowledge record. Returns the number of
    /// chunks removed.
    ///
    /// Points listed in the record are deleted by id, then the collection is
    /// dropped along with anything the record did not list.
    #[instrument(skip(self))]
    pub async fn delete_video(&self, video_id: &str) -> Result<usize> {
        let record = self.records.get_record(video_id).await?;
        let info = self.index.collection_info(video_id).await?;

        if info.dimension.is_none() && record.is_none() {
            return Err(CuebaseError::NotFound(format!("Video {}", video_id)));
        }

        let by_id = match &record {
            Some(record) if !record.vector_ids.is_empty() => {
                self.index.delete_by_ids(&record.vector_ids).await?
            }
            _ => 0,
        };
        let unlisted = self.index.collection_info(video_id).await?.chunk_count;
        self.index.drop_collection(video_id).await?;
        self.records.delete_record(video_id).await?;

        let removed = by_id + unlisted;
        info!(
            "Deleted {} chunks for video {} ({} by id)",
            removed, video_id, by_id
        );
        Ok(removed)
    }

    /// Rebuild a video's index from its stored caption text.
    pub async fn reingest(&self, video_id: &str) -> Result<IngestOutcome> {
        let record = self
            .records
            .get_record(video_id)
            .await?
            .ok_or_else(|| CuebaseError::NotFound(format!("Video {}", video_id)))?;

        info!("Re-ingesting video {} from stored captions", video_id);
        self.ingest(
            video_id,
            &record.raw_payload,
            IngestOptions {
                clear_existing: true,
            },
        )
        .await
    }

    /// All knowledge records, most recently updated first.
    pub async fn list_videos(&self) -> Result<Vec<KnowledgeRecord>> {
        self.records.list_records().await
    }

    pub async fn knowledge_record(&self, video_id: &str) -> Result<Option<KnowledgeRecord>> {
        self.records.get_record(video_id).await
    }

    /// The parsed transcript of a video's stored captions.
    pub async fn transcript(&self, video_id: &str) -> Result<Transcript> {
        let record = self
            .records
            .get_record(video_id)
            .await?
            .ok_or_else(|| CuebaseError::NotFound(format!("Video {}", video_id)))?;

        let report = parse_captions(&record.raw_payload)?;
        Ok(Transcript::new(video_id.to_string(), report.segments))
    }

    /// Summary, outline and key terms of a video's stored transcript.
    #[instrument(skip(self))]
    pub async fn analyze(&self, video_id: &str) -> Result<VideoAnalysis> {
        validate_video_id(video_id)?;
        let transcript = self.transcript(video_id).await?;
        self.analyzer.analyze(&transcript.full_text()).await
    }

    /// A short title for a conversation opened with `first_question`.
    pub async fn session_title(&self, first_question: &str) -> String {
        self.analyzer.session_title(first_question).await
    }
}

fn validate_video_id(video_id: &str) -> Result<()> {
    if video_id.trim().is_empty() {
        return Err(CuebaseError::InvalidInput("Video id must not be empty".to_string()));
    }
    Ok(())
}
