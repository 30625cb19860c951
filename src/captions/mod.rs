//! Caption track handling.
//!
//! Parses WebVTT caption tracks into ordered, time-stamped transcript
//! segments and renders segments back out for export.

mod format;
mod models;
pub mod vtt;

pub use format::{format_segments, ExportFormat, SegmentExport, TranscriptExport};
pub use models::{format_clock, Transcript, TranscriptSegment};
pub use vtt::{parse_captions, parse_vtt, CueOutcome, ParseReport, SkipReason, SkippedCue};
