//! Transcript import: WhisperX JSON and SRT into timed segments.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::subtitles::splitter::normalize_text;
use crate::subtitles::types::{SubtitleSegment, SubtitleWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TranscriptFormat {
    Whisperx,
    Srt,
}

impl TranscriptFormat {
    /// Guess from the file extension; anything but `.srt` is treated as WhisperX.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("srt") => TranscriptFormat::Srt,
            _ => TranscriptFormat::Whisperx,
        }
    }
}

pub fn parse_transcript(input: &str, format: TranscriptFormat) -> Result<Vec<SubtitleSegment>> {
    match format {
        TranscriptFormat::Whisperx => parse_whisper_json(input),
        TranscriptFormat::Srt => parse_srt(input),
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
    // Fallback if words are missing (e.g. no alignment)
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    // Unaligned tokens (numbers, symbols) come without timing
    start: Option<f64>,
    end: Option<f64>,
}

const MAX_CLUSTER_SIZE: usize = 10;
const PAUSE_THRESHOLD_SECONDS: f64 = 0.6;

/// Parse WhisperX output and regroup its words into segments, splitting on
/// pauses longer than 0.6s and after ten words.
pub fn parse_whisper_json(json_str: &str) -> Result<Vec<SubtitleSegment>> {
    let output: WhisperOutput =
        serde_json::from_str(json_str).context("Failed to parse WhisperX JSON output")?;

    // Segments without word alignment become one pseudo-word each
    let mut all_words: Vec<SubtitleWord> = Vec::new();
    for segment in output.segments {
        if segment.words.is_empty() {
            if !segment.text.trim().is_empty() {
                all_words.push(SubtitleWord::new(
                    normalize_text(&segment.text),
                    segment.start,
                    segment.end,
                ));
            }
            continue;
        }
        for word in segment.words {
            let text = word.word.trim();
            if text.is_empty() {
                continue;
            }
            // Borrow timing from the previous word when alignment is missing
            let previous_end = all_words.last().map(|w| w.end).unwrap_or(segment.start);
            let start = word.start.unwrap_or(previous_end);
            let end = word.end.unwrap_or(start).max(start);
            all_words.push(SubtitleWord::new(text, start, end));
        }
    }

    let mut segments = Vec::new();
    let mut current_cluster: Vec<SubtitleWord> = Vec::new();

    for word in all_words {
        if let Some(last) = current_cluster.last() {
            let pause = word.start - last.end;
            if pause > PAUSE_THRESHOLD_SECONDS || current_cluster.len() >= MAX_CLUSTER_SIZE {
                segments.push(segment_from_cluster(std::mem::take(&mut current_cluster)));
            }
        }
        current_cluster.push(word);
    }

    if !current_cluster.is_empty() {
        segments.push(segment_from_cluster(current_cluster));
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

fn segment_from_cluster(cluster: Vec<SubtitleWord>) -> SubtitleSegment {
    let start = cluster.first().map(|w| w.start).unwrap_or(0.0);
    let end = cluster.last().map(|w| w.end).unwrap_or(0.0);
    let text = cluster
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    // Pseudo-words carry whole sentences; keep word timing only when it maps
    // one-to-one onto the text tokens
    let words = if cluster.iter().all(|w| !w.text.contains(char::is_whitespace)) {
        cluster
    } else {
        Vec::new()
    };

    SubtitleSegment::new(text, start, end).with_words(words)
}

/// Parse SubRip cues straight into segments.
///
/// Cue numbers are optional. Markup such as `<i>` or `{\an8}` is stripped
/// and multi-line cue text is joined with single spaces. Cues left without
/// text are dropped.
pub fn parse_srt(input: &str) -> Result<Vec<SubtitleSegment>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in input.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();
        if !line.is_empty() {
            current.push(line);
        } else if !current.is_empty() {
            blocks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut segments = Vec::new();
    for (position, block) in blocks.iter().enumerate() {
        let segment = srt_cue(block).with_context(|| format!("SRT cue #{}", position + 1))?;
        segments.extend(segment);
    }
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

fn srt_cue(lines: &[&str]) -> Result<Option<SubtitleSegment>> {
    let timing_at = lines
        .iter()
        .position(|line| line.contains("-->"))
        .context("missing 'start --> end' line")?;
    if timing_at > 1 {
        bail!("unexpected text before the timing line");
    }

    let (start_raw, rest) = lines[timing_at]
        .split_once("-->")
        .context("missing '-->'")?;
    // Position settings such as `X1:40` may trail the end time
    let end_raw = rest.split_whitespace().next().unwrap_or_default();

    let start = srt_seconds(start_raw)?;
    let end = srt_seconds(end_raw)?;
    if end < start {
        bail!("cue ends before it starts: {} --> {end_raw}", start_raw.trim());
    }

    let text = normalize_text(&strip_markup(&lines[timing_at + 1..].join(" ")));
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(SubtitleSegment::new(text, start, end)))
}

/// `HH:MM:SS,mmm` (or `MM:SS.mmm`) to seconds. Missing millisecond digits
/// are zero-padded, extra ones ignored.
fn srt_seconds(value: &str) -> Result<f64> {
    let value = value.trim();
    let (clock, fraction) = value.split_once([',', '.']).unwrap_or((value, ""));

    let fields: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        bail!("expected HH:MM:SS,mmm, got '{value}'");
    }
    let mut total_ms: u64 = 0;
    for field in fields {
        let number: u64 = field
            .parse()
            .with_context(|| format!("invalid number '{field}' in timestamp '{value}'"))?;
        total_ms = total_ms * 60 + number;
    }
    total_ms *= 1000;

    if !fraction.is_empty() {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid milliseconds in timestamp '{value}'");
        }
        let digits = &fraction[..fraction.len().min(3)];
        let millis: u64 = format!("{digits:0<3}").parse()?;
        total_ms += millis;
    }
    Ok(total_ms as f64 / 1000.0)
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut closing: Option<char> = None;
    for ch in text.chars() {
        match closing {
            Some(close) if ch == close => closing = None,
            Some(_) => {}
            None if ch == '<' => closing = Some('>'),
            None if ch == '{' => closing = Some('}'),
            None => out.push(ch),
        }
    }
    out
}
