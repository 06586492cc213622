use serde::{Deserialize, Serialize};

use super::style::{Animation, OverflowStrategy, Placement, PlacementStrategy, SubtitleSize};

pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 32;
pub const DEFAULT_MAX_LINES: usize = 3;
pub const DEFAULT_MIN_LINE_SECONDS: f64 = 0.35;
pub const DEFAULT_LONG_SENTENCE_CHARS: usize = 60;

/// One spoken word with its time interval in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl SubtitleWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Accent color plus the phrases it highlights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emphasis {
    pub phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One rendered line inside a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSubtitleLine {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub size: SubtitleSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
}

impl SceneSubtitleLine {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            size: SubtitleSize::default(),
            emphasis: None,
        }
    }
}

/// One spoken utterance. `lines` stays empty until the splitter runs and the
/// direction fields stay unset until the director runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub lines: Vec<SceneSubtitleLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<SubtitleWord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SubtitleSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
}

impl SubtitleSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            lines: Vec::new(),
            words: Vec::new(),
            image_url: None,
            video_url: None,
            placement: None,
            animation: None,
            size: None,
            emphasis: None,
        }
    }

    pub fn with_words(mut self, words: Vec<SubtitleWord>) -> Self {
        self.words = words;
        self
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Clamp negative or inverted timing instead of rejecting the segment.
    pub fn normalize_timing(&mut self) {
        if !self.start.is_finite() || self.start < 0.0 {
            self.start = 0.0;
        }
        if !self.end.is_finite() || self.end < self.start {
            self.end = self.start;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeArea {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl SafeArea {
    /// Margins used for dynamic layouts when the request gives none.
    pub const DYNAMIC_DEFAULT: SafeArea = SafeArea {
        top: 0.12,
        bottom: 0.14,
        left: 0.06,
        right: 0.06,
    };

    /// Keep every margin within `[0, 0.45]` so the text area never collapses.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 0.45) } else { 0.0 };
        Self {
            top: clamp(self.top),
            bottom: clamp(self.bottom),
            left: clamp(self.left),
            right: clamp(self.right),
        }
    }
}

/// Anti-flicker limits for dynamic placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicRules {
    pub min_seconds_between_placement_changes: f64,
    pub max_center_blocks_in_row: usize,
}

impl Default for DynamicRules {
    fn default() -> Self {
        Self {
            min_seconds_between_placement_changes: 2.0,
            max_center_blocks_in_row: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConstraints {
    pub avoid_center_long_sentences: bool,
    pub prefer_center_for_emphasis: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_sentence_chars: Option<usize>,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            avoid_center_long_sentences: true,
            prefer_center_for_emphasis: true,
            long_sentence_chars: None,
        }
    }
}

impl LayoutConstraints {
    pub fn long_sentence_threshold(&self) -> usize {
        self.long_sentence_chars
            .filter(|chars| *chars > 0)
            .unwrap_or(DEFAULT_LONG_SENTENCE_CHARS)
    }
}

/// Global layout of one timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleLayout {
    pub placement_strategy: PlacementStrategy,
    pub default_placement: Placement,
    pub max_lines: usize,
    pub max_chars_per_line: usize,
    pub overflow_strategy: OverflowStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<LayoutConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_area: Option<SafeArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_rules: Option<DynamicRules>,
}

impl Default for SubtitleLayout {
    fn default() -> Self {
        Self {
            placement_strategy: PlacementStrategy::default(),
            default_placement: Placement::default(),
            max_lines: DEFAULT_MAX_LINES,
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            overflow_strategy: OverflowStrategy::default(),
            constraints: None,
            safe_area: None,
            dynamic_rules: None,
        }
    }
}

/// Timing adjustments for the renderer. The pipeline carries them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_end_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_offset_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default)]
    pub duration_seconds: f64,
}

/// Clamp a requested count to a positive value, using `fallback` otherwise.
pub fn positive_or(value: Option<i64>, fallback: usize) -> usize {
    match value {
        Some(v) if v >= 1 => v as usize,
        _ => fallback,
    }
}
