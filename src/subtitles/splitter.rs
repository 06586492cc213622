//! Line splitting.
//!
//! Text is tokenized on whitespace and packed greedily into lines of at most
//! `max_chars` characters. A word longer than the limit is kept whole on its
//! own line. Line timing is either interpolated by character count or taken
//! directly from word timings.

use std::ops::Range;

use super::overflow::resolve_overflow;
use super::style::OverflowStrategy;
use super::types::{DEFAULT_MIN_LINE_SECONDS, SceneSubtitleLine, SubtitleWord};

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
enum LineTiming {
    /// Spread the segment duration over lines by character count.
    Proportional,
    /// One `(start, end)` span per token, taken from word timings.
    Words {
        spans: Vec<(f64, f64)>,
        min_line_seconds: f64,
    },
}

/// Tokenized segment text plus the timing model used to turn token groups
/// into timed lines. Shared by the splitter and the overflow resolver so that
/// re-packing always produces lines with consistent timing.
#[derive(Debug, Clone)]
pub struct LineSource {
    tokens: Vec<String>,
    start: f64,
    end: f64,
    timing: LineTiming,
}

impl LineSource {
    pub fn proportional(text: &str, start: f64, end: f64) -> Self {
        let (start, end) = sane_interval(start, end);
        Self {
            tokens: text.split_whitespace().map(str::to_string).collect(),
            start,
            end,
            timing: LineTiming::Proportional,
        }
    }

    /// Word-timed source. Falls back to proportional timing when the words
    /// do not line up one-to-one with the text tokens.
    pub fn word_timed(
        text: &str,
        start: f64,
        end: f64,
        words: &[SubtitleWord],
        min_line_seconds: f64,
    ) -> Self {
        let mut source = Self::proportional(text, start, end);
        if words.is_empty() || words.len() != source.tokens.len() {
            return source;
        }

        let spans = words
            .iter()
            .map(|word| {
                let word_start = if word.start.is_finite() { word.start } else { source.start };
                let word_end = if word.end.is_finite() { word.end } else { word_start };
                (word_start, word_end.max(word_start))
            })
            .collect();
        let min_line_seconds = if min_line_seconds.is_finite() && min_line_seconds > 0.0 {
            min_line_seconds
        } else {
            DEFAULT_MIN_LINE_SECONDS
        };

        source.timing = LineTiming::Words {
            spans,
            min_line_seconds,
        };
        source
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Character count of the normalized text.
    pub fn text_len(&self) -> usize {
        if self.tokens.is_empty() {
            return 0;
        }
        self.group_chars(&(0..self.tokens.len()))
    }

    pub(super) fn group_chars(&self, group: &Range<usize>) -> usize {
        let words: usize = self.tokens[group.clone()]
            .iter()
            .map(|token| token.chars().count())
            .sum();
        words + group.len().saturating_sub(1)
    }

    /// Greedy packing into token ranges.
    pub(super) fn pack_groups(&self, max_chars: usize) -> Vec<Range<usize>> {
        let max_chars = max_chars.max(1);
        let mut groups = Vec::new();
        let mut current_start = 0;
        let mut current_len = 0;

        for (idx, token) in self.tokens.iter().enumerate() {
            let token_len = token.chars().count();
            if idx == current_start {
                current_len = token_len;
                continue;
            }
            if current_len + 1 + token_len <= max_chars {
                current_len += 1 + token_len;
            } else {
                groups.push(current_start..idx);
                current_start = idx;
                current_len = token_len;
            }
        }

        if current_start < self.tokens.len() {
            groups.push(current_start..self.tokens.len());
        }
        groups
    }

    pub fn pack(&self, max_chars: usize) -> Vec<SceneSubtitleLine> {
        self.build_lines(&self.pack_groups(max_chars))
    }

    /// Recover the token ranges behind lines produced from this source.
    pub(super) fn groups_for(&self, lines: &[SceneSubtitleLine]) -> Vec<Range<usize>> {
        let mut groups = Vec::with_capacity(lines.len());
        let mut cursor = 0;
        for line in lines {
            let count = line.text.split_whitespace().count();
            let end = (cursor + count).min(self.tokens.len());
            if end > cursor {
                groups.push(cursor..end);
            }
            cursor = end;
        }
        match groups.last_mut() {
            Some(last) => last.end = self.tokens.len(),
            None if !self.tokens.is_empty() => groups.push(0..self.tokens.len()),
            None => {}
        }
        groups
    }

    pub(super) fn build_lines(&self, groups: &[Range<usize>]) -> Vec<SceneSubtitleLine> {
        if groups.is_empty() {
            return Vec::new();
        }
        let texts: Vec<String> = groups
            .iter()
            .map(|group| self.tokens[group.clone()].join(" "))
            .collect();

        let intervals = match &self.timing {
            LineTiming::Proportional => self.proportional_intervals(groups),
            LineTiming::Words {
                spans,
                min_line_seconds,
            } => self.word_intervals(groups, spans, *min_line_seconds),
        };

        texts
            .into_iter()
            .zip(intervals)
            .map(|(text, (start, end))| SceneSubtitleLine::new(text, start, end))
            .collect()
    }

    fn proportional_intervals(&self, groups: &[Range<usize>]) -> Vec<(f64, f64)> {
        let weights: Vec<usize> = groups.iter().map(|g| self.group_chars(g)).collect();
        let total: usize = weights.iter().sum::<usize>().max(1);
        let duration = self.end - self.start;

        let mut cursor = self.start;
        let mut intervals = Vec::with_capacity(groups.len());
        for (idx, weight) in weights.iter().enumerate() {
            let line_end = if idx + 1 == weights.len() {
                // pinned to avoid rounding drift
                self.end
            } else {
                (cursor + duration * (*weight as f64) / (total as f64)).min(self.end)
            };
            intervals.push((cursor, line_end));
            cursor = line_end;
        }
        intervals
    }

    fn word_intervals(
        &self,
        groups: &[Range<usize>],
        spans: &[(f64, f64)],
        min_line_seconds: f64,
    ) -> Vec<(f64, f64)> {
        let clamp = |t: f64| t.clamp(self.start, self.end);

        let mut intervals: Vec<(f64, f64)> = Vec::with_capacity(groups.len());
        let mut previous_end = self.start;
        for group in groups {
            let first = spans[group.start].0;
            let last = spans[group.end - 1].1;
            let start = clamp(first).max(previous_end);
            let end = clamp(last).max(start);
            intervals.push((start, end));
            previous_end = end;
        }

        // Extend short lines into the silence before the next line.
        for idx in 0..intervals.len() {
            let limit = intervals
                .get(idx + 1)
                .map(|next| next.0)
                .unwrap_or(self.end);
            let (start, end) = intervals[idx];
            if end - start < min_line_seconds {
                intervals[idx].1 = (start + min_line_seconds).min(limit).max(end);
            }
        }
        intervals
    }
}

fn sane_interval(start: f64, end: f64) -> (f64, f64) {
    let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
    let end = if end.is_finite() { end.max(start) } else { start };
    (start, end)
}

/// Character-based split of one segment.
pub fn split(
    text: &str,
    start: f64,
    end: f64,
    max_chars: usize,
    max_lines: usize,
    overflow: OverflowStrategy,
) -> Vec<SceneSubtitleLine> {
    let source = LineSource::proportional(text, start, end);
    split_source(&source, max_chars, max_lines, overflow)
}

/// Word-timing split of one segment. Lines take their timing from their
/// first and last word; lines shorter than `min_line_seconds` are extended.
#[allow(clippy::too_many_arguments)]
pub fn split_with_word_timing(
    text: &str,
    start: f64,
    end: f64,
    words: &[SubtitleWord],
    max_chars: usize,
    max_lines: usize,
    overflow: OverflowStrategy,
    min_line_seconds: f64,
) -> Vec<SceneSubtitleLine> {
    let source = LineSource::word_timed(text, start, end, words, min_line_seconds);
    split_source(&source, max_chars, max_lines, overflow)
}

pub fn split_source(
    source: &LineSource,
    max_chars: usize,
    max_lines: usize,
    overflow: OverflowStrategy,
) -> Vec<SceneSubtitleLine> {
    if source.is_empty() {
        return Vec::new();
    }
    let lines = source.pack(max_chars);
    if lines.len() > max_lines.max(1) {
        resolve_overflow(source, lines, max_chars, max_lines, overflow)
    } else {
        lines
    }
}
