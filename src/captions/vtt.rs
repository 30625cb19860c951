//! WebVTT caption parsing.
//!
//! A caption track is a header line, optional metadata blocks (`NOTE`,
//! `STYLE`, `REGION`) and cue blocks separated by blank lines. Each cue holds
//! an optional identifier line, a `start --> end` timing line and one or
//! more text lines.
//!
//! Parsing is per-cue: a malformed cue becomes a [`SkippedCue`] in the
//! [`ParseReport`] and never aborts the rest of the track.

use super::TranscriptSegment;
use crate::error::{CuebaseError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2})(?:[.,](\d{1,9}))?$")
        .expect("Invalid timestamp regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

/// Why a cue was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No line in the cue contains `-->`.
    MissingTimestamp,
    /// One side of the timing line is not `HH:MM:SS.mmm` or `MM:SS.mmm`.
    InvalidTimestamp(String),
    /// The end timestamp precedes the start timestamp.
    EndBeforeStart { start: f64, end: f64 },
    /// The cue has a timing line but no text.
    MissingText,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTimestamp => write!(f, "no timestamp line"),
            SkipReason::InvalidTimestamp(raw) => write!(f, "invalid timestamp '{}'", raw),
            SkipReason::EndBeforeStart { start, end } => {
                write!(f, "end {:.3}s is before start {:.3}s", end, start)
            }
            SkipReason::MissingText => write!(f, "no cue text"),
        }
    }
}

/// Result of parsing a single cue block.
#[derive(Debug, Clone, PartialEq)]
pub enum CueOutcome {
    Parsed(TranscriptSegment),
    Skipped(SkipReason),
}

/// A cue that was dropped during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCue {
    /// 1-based line number where the cue block starts.
    pub line: usize,
    pub reason: SkipReason,
}

/// Outcome of parsing a whole caption track.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Parsed segments in non-decreasing start order.
    pub segments: Vec<TranscriptSegment>,
    /// Cues that were skipped, in file order.
    pub skipped: Vec<SkippedCue>,
}

impl ParseReport {
    /// Number of cues that were skipped.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Parse a caption track, failing with [`CuebaseError::EmptyTranscript`]
/// when no usable segment remains.
pub fn parse_captions(content: &str) -> Result<ParseReport> {
    let report = parse_vtt(content);

    if report.is_empty() {
        warn!(
            "No caption segments parsed ({} cues skipped)",
            report.skipped_count()
        );
        return Err(CuebaseError::EmptyTranscript);
    }

    Ok(report)
}

/// Parse a caption track into segments, collecting skipped cues.
pub fn parse_vtt(content: &str) -> ParseReport {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut report = ParseReport::default();

    debug!("Parsing caption track ({} bytes)", normalized.len());

    for (position, (line, mut lines)) in split_blocks(&normalized).into_iter().enumerate() {
        if position == 0 && is_header(lines[0]) {
            lines.remove(0);
            // Header metadata lines without a timing line are not a cue.
            if !lines.iter().any(|l| l.contains("-->")) {
                continue;
            }
        }

        if is_metadata_block(lines[0]) {
            continue;
        }

        match parse_cue(&lines) {
            CueOutcome::Parsed(segment) => report.segments.push(segment),
            CueOutcome::Skipped(reason) => {
                warn!("Skipping caption cue at line {}: {}", line, reason);
                report.skipped.push(SkippedCue { line, reason });
            }
        }
    }

    // Stable: cues sharing a start time keep file order.
    report
        .segments
        .sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    info!(
        "Parsed {} caption segments ({} cues skipped)",
        report.segments.len(),
        report.skipped_count()
    );

    report
}

/// Parse a single cue block.
pub fn parse_cue(lines: &[&str]) -> CueOutcome {
    let Some(timing_index) = lines.iter().position(|l| l.contains("-->")) else {
        return CueOutcome::Skipped(SkipReason::MissingTimestamp);
    };

    let (start_seconds, end_seconds) = match parse_timing(lines[timing_index]) {
        Ok(timing) => timing,
        Err(reason) => return CueOutcome::Skipped(reason),
    };

    // Lines before the timing line are the cue identifier.
    let text = lines[timing_index + 1..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.contains("-->") && !is_numeric(l))
        .map(strip_tags)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return CueOutcome::Skipped(SkipReason::MissingText);
    }

    CueOutcome::Parsed(TranscriptSegment::new(start_seconds, end_seconds, text))
}

/// Parse a `start --> end [settings]` timing line.
fn parse_timing(line: &str) -> std::result::Result<(f64, f64), SkipReason> {
    let (left, right) = line
        .split_once("-->")
        .ok_or(SkipReason::MissingTimestamp)?;

    let start_raw = left.trim();
    // Cue settings (e.g. `align:start`) may follow the end timestamp.
    let end_raw = right.split_whitespace().next().unwrap_or("");

    let start = parse_timestamp(start_raw)
        .ok_or_else(|| SkipReason::InvalidTimestamp(start_raw.to_string()))?;
    let end = parse_timestamp(end_raw)
        .ok_or_else(|| SkipReason::InvalidTimestamp(end_raw.to_string()))?;

    if end < start {
        return Err(SkipReason::EndBeforeStart { start, end });
    }

    Ok((start, end))
}

/// Convert `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let caps = TIMESTAMP_RE.captures(raw.trim())?;

    let hours: u64 = match caps.get(1) {
        Some(h) => h.as_str().parse().ok()?,
        None => 0,
    };
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;

    if seconds >= 60 || (caps.get(1).is_some() && minutes >= 60) {
        return None;
    }

    let fraction = match caps.get(4) {
        Some(frac) => format!("0.{}", frac.as_str()).parse::<f64>().ok()?,
        None => 0.0,
    };

    // Absurd hour fields overflow; treat them as invalid.
    let whole = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;

    Some(whole as f64 + fraction)
}

/// Split text into blocks of non-blank lines, tagged with the 1-based line
/// number of each block's first line.
fn split_blocks(content: &str) -> Vec<(usize, Vec<&str>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start_line = 0;

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push((start_line, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start_line = i + 1;
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push((start_line, current));
    }

    blocks
}

fn is_header(line: &str) -> bool {
    line.trim_start_matches('\u{feff}').starts_with("WEBVTT")
}

fn is_metadata_block(first_line: &str) -> bool {
    let first = first_line.trim();
    ["NOTE", "STYLE", "REGION"].iter().any(|kw| {
        first == *kw
            || first
                .strip_prefix(*kw)
                .is_some_and(|rest| rest.starts_with([' ', '\t']))
    })
}

fn is_numeric(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit())
}

fn strip_tags(line: &str) -> String {
    TAG_RE
        .replace_all(line, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
