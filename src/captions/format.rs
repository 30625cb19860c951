//! Segment export formatting (JSON, SRT, VTT).

use super::TranscriptSegment;
use serde::Serialize;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportFormat {
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "srt" => Ok(ExportFormat::Srt),
            "vtt" | "webvtt" => Ok(ExportFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable export of a video's segments.
#[derive(Debug, Serialize)]
pub struct TranscriptExport<'a> {
    pub video_id: &'a str,
    pub segment_count: usize,
    pub segments: Vec<SegmentExport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport<'a> {
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: &'a str,
}

/// Render segments in the requested format.
pub fn format_segments(video_id: &str, segments: &[TranscriptSegment], format: ExportFormat) -> String {
    match format {
        ExportFormat::Json => {
            let export = TranscriptExport {
                video_id,
                segment_count: segments.len(),
                segments: segments
                    .iter()
                    .enumerate()
                    .map(|(index, s)| SegmentExport {
                        index,
                        start_seconds: s.start_seconds,
                        end_seconds: s.end_seconds,
                        text: &s.text,
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
        }
        ExportFormat::Srt => render_cues(segments, "", ','),
        ExportFormat::Vtt => render_cues(segments, "WEBVTT\n\n", '.'),
    }
}

fn render_cues(segments: &[TranscriptSegment], preamble: &str, ms_separator: char) -> String {
    let mut output = String::from(preamble);

    for (i, segment) in segments.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            cue_timestamp(segment.start_seconds, ms_separator),
            cue_timestamp(segment.end_seconds, ms_separator),
            segment.text
        ));
    }

    output
}

/// Format a cue timestamp as `HH:MM:SS<sep>mmm`.
fn cue_timestamp(seconds: f64, ms_separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, ms_separator, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::parse_vtt;

    fn sample() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.5, "Hello world."),
            TranscriptSegment::new(2.5, 5.0, "This is a test."),
        ]
    }

    #[test]
    fn test_format_json() {
        let json = format_segments("vid-7", &sample(), ExportFormat::Json);
        assert!(json.contains("\"video_id\": \"vid-7\""));
        assert!(json.contains("\"segment_count\": 2"));
    }

    #[test]
    fn test_format_srt() {
        let srt = format_segments("vid-7", &sample(), ExportFormat::Srt);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world."));
    }

    #[test]
    fn test_vtt_export_parses_back() {
        let vtt = format_segments("vid-7", &sample(), ExportFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT"));

        let report = parse_vtt(&vtt);
        assert_eq!(report.segments, sample());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("webvtt".parse::<ExportFormat>().unwrap(), ExportFormat::Vtt);
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
