//! End-to-end ingestion and question answering with offline components.

use async_trait::async_trait;
use cuebase::config::{Prompts, Settings};
use cuebase::embedding::{Embedder, HashEmbedder};
use cuebase::orchestrator::{IngestOptions, Orchestrator};
use cuebase::rag::{ChatMessage, GenerationRequest, Generator};
use cuebase::vector_store::{
    KnowledgeStore, MemoryVectorStore, SqliteVectorStore, VectorIndex, VectorizationStatus,
};
use cuebase::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Answers every request, recording it. Engagement requests get a quoted
/// follow-up question.
#[derive(Default)]
struct RecordingGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if request.system == Prompts::default().rag.engagement_system {
            Ok("\"Can you spot the pattern in segment 9?\"".to_string())
        } else {
            Ok("Grounded answer.".to_string())
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Twelve 10-second cues: "Segment 0" .. "Segment 11".
fn lecture_captions() -> String {
    let mut vtt = String::from("WEBVTT\n\n");
    for i in 0..12 {
        let start = i * 10;
        let end = start + 10;
        vtt.push_str(&format!(
            "{}\n00:{:02}:{:02}.000 --> 00:{:02}:{:02}.000\nSegment {}\n\n",
            i + 1,
            start / 60,
            start % 60,
            end / 60,
            end % 60,
            i
        ));
    }
    vtt
}

struct Harness {
    orchestrator: Orchestrator,
    store: Arc<MemoryVectorStore>,
    generator: Arc<RecordingGenerator>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryVectorStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(32).unwrap());

    let orchestrator = Orchestrator::with_components(
        Settings::default(),
        Prompts::default(),
        embedder,
        store.clone(),
        store.clone(),
        generator.clone(),
    )
    .unwrap();

    Harness {
        orchestrator,
        store,
        generator,
    }
}

#[tokio::test]
async fn ingest_builds_overlapping_chunks() {
    let h = harness();

    let outcome = h
        .orchestrator
        .ingest("lecture", &lecture_captions(), IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.chunk_count, 3);
    assert!(outcome.skipped_cues.is_empty());

    let chunks = h.store.get_all("lecture").await.unwrap();
    let ranges: Vec<(f64, f64)> = chunks
        .iter()
        .map(|c| (c.metadata.start_seconds, c.metadata.end_seconds))
        .collect();
    assert_eq!(ranges, vec![(0.0, 50.0), (40.0, 90.0), (80.0, 120.0)]);
    assert_eq!(chunks[0].text, "Segment 0 Segment 1 Segment 2 Segment 3 Segment 4");
    assert_eq!(chunks[2].text, "Segment 8 Segment 9 Segment 10 Segment 11");
}

#[tokio::test]
async fn reingest_with_clear_replaces_previous_vectors() {
    let h = harness();
    let captions = lecture_captions();

    let first = h
        .orchestrator
        .ingest("lecture", &captions, IngestOptions::default())
        .await
        .unwrap();
    let second = h
        .orchestrator
        .ingest("lecture", &captions, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(first.chunk_count, second.chunk_count);

    let present: HashSet<_> = h
        .store
        .get_all("lecture")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(present.len(), 3);
    assert!(first.vector_ids.iter().all(|id| !present.contains(id)));
    assert_eq!(present, second.vector_ids.iter().copied().collect());

    let record = h.orchestrator.knowledge_record("lecture").await.unwrap().unwrap();
    assert_eq!(record.status, VectorizationStatus::Completed);
    assert_eq!(record.vector_ids, second.vector_ids);
}

#[tokio::test]
async fn two_segment_reingest_replaces_vector_ids() {
    let h = harness();
    let captions = "WEBVTT\n\n00:00.000 --> 00:04.000\nFirst line\n\n00:04.000 --> 00:09.000\nSecond line\n";

    let first = h
        .orchestrator
        .ingest("short", captions, IngestOptions { clear_existing: true })
        .await
        .unwrap();
    let second = h
        .orchestrator
        .ingest("short", captions, IngestOptions { clear_existing: true })
        .await
        .unwrap();

    assert_eq!(first.chunk_count, 1);
    assert_eq!(second.chunk_count, first.chunk_count);

    let present: Vec<_> = h
        .store
        .get_all("short")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(present, second.vector_ids);
    assert!(!present.contains(&first.vector_ids[0]));
}

#[tokio::test]
async fn ask_past_the_end_skips_engagement_prompt() {
    let h = harness();
    h.orchestrator
        .ingest("lecture", &lecture_captions(), IngestOptions::default())
        .await
        .unwrap();

    let response = h
        .orchestrator
        .ask("lecture", "What happens next?", Some(1000.0), &[])
        .await
        .unwrap();

    assert!(!response.referenced_chunks.is_empty());
    assert!(response.context_prompt.is_none());
    assert_eq!(h.generator.requests().len(), 1);
}

#[tokio::test]
async fn ask_unknown_video_has_zero_confidence() {
    let h = harness();

    let response = h
        .orchestrator
        .ask("never-ingested", "What is covered?", None, &[])
        .await
        .unwrap();

    assert_eq!(response.confidence_score, 0);
    assert!(response.referenced_chunks.is_empty());
    assert!(response.context_prompt.is_none());
}

#[tokio::test]
async fn ask_at_timestamp_prefers_nearby_chunks() {
    let h = harness();
    h.orchestrator
        .ingest("lecture", &lecture_captions(), IngestOptions::default())
        .await
        .unwrap();

    let history = vec![
        ChatMessage::user("What is this lecture about?"),
        ChatMessage::assistant("Segments."),
    ];
    let response = h
        .orchestrator
        .ask("lecture", "What happens here?", Some(65.0), &history)
        .await
        .unwrap();

    // Window [35, 95] covers all three chunks, nearest start first.
    let order: Vec<u32> = response
        .referenced_chunks
        .iter()
        .map(|c| c.sequence_index())
        .collect();
    assert_eq!(order, vec![2, 1, 0]);
    assert_eq!(response.confidence_score, 100);
    assert_eq!(response.answer, "Grounded answer.");
    assert_eq!(
        response.context_prompt.as_deref(),
        Some("Can you spot the pattern in segment 9?")
    );

    let requests = h.generator.requests();
    assert_eq!(requests.len(), 2);
    let answer_turn = requests[0].messages.last().unwrap();
    assert!(answer_turn.content.contains("[1] (1:20–2:00) Segment 8"));
    assert_eq!(requests[0].messages.len(), 3);
    assert!(requests[1].messages[0].content.contains("Segment 8 Segment 9"));
}

#[tokio::test]
async fn semantic_match_ranks_exact_chunk_first() {
    let h = harness();
    h.orchestrator
        .ingest("lecture", &lecture_captions(), IngestOptions::default())
        .await
        .unwrap();

    let response = h
        .orchestrator
        .ask("lecture", "Segment 4 Segment 5 Segment 6 Segment 7 Segment 8", None, &[])
        .await
        .unwrap();

    assert_eq!(response.referenced_chunks.len(), 3);
    assert_eq!(response.referenced_chunks[0].sequence_index(), 1);
    assert!(response.referenced_chunks[0].distance < 1e-4);
    assert!(response.context_prompt.is_none());
}

#[tokio::test]
async fn malformed_cues_are_reported_not_fatal() {
    let h = harness();
    let captions = "WEBVTT\n\n00:00.000 --> 00:05.000\nHello\n\nnot a timing line\ntext\n\n00:09.000 --> 00:06.000\nBackwards\n\n00:10.000 --> 00:12.000\nWorld\n";

    let outcome = h
        .orchestrator
        .ingest("short", captions, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.chunk_count, 1);
    assert_eq!(outcome.skipped_cues.len(), 2);

    let chunks = h.store.get_all("short").await.unwrap();
    assert_eq!(chunks[0].text, "Hello World");
}

#[tokio::test]
async fn sqlite_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.db");

    let build = || {
        let store = Arc::new(SqliteVectorStore::new(&path).unwrap());
        Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(HashEmbedder::new(32).unwrap()),
            store.clone() as Arc<dyn VectorIndex>,
            store as Arc<dyn KnowledgeStore>,
            Arc::new(RecordingGenerator::default()),
        )
        .unwrap()
    };

    let outcome = build()
        .ingest("lecture", &lecture_captions(), IngestOptions::default())
        .await
        .unwrap();

    let reopened = build();
    let info = reopened.collection_info("lecture").await.unwrap();
    assert_eq!(info.chunk_count, 3);
    assert_eq!(info.dimension, Some(32));

    let videos = reopened.list_videos().await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].vector_ids, outcome.vector_ids);

    assert_eq!(reopened.delete_video("lecture").await.unwrap(), 3);
    assert!(reopened.list_videos().await.unwrap().is_empty());
}
