//! Request resolution and stage orchestration.
//!
//! A [`TimelineRequest`] leaves most settings optional. They are resolved
//! against the [`DirectorConfig`] and the built-in defaults, then the pure
//! stages run in order: split (with overflow resolution), direct, assemble.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::DirectorConfig;
use crate::subtitles::direction::{DirectionRequest, build_direction};
use crate::subtitles::presets::{resolve_theme, style_preset};
use crate::subtitles::splitter::{normalize_text, split, split_with_word_timing};
use crate::subtitles::style::{
    DirectionPreset, OverflowStrategy, Placement, PlacementStrategy, SubtitleStyle,
    resolve_preset,
};
use crate::subtitles::timeline::{TimelineResponse, assemble};
use crate::subtitles::types::{
    AudioTrack, DynamicRules, LayoutConstraints, RenderHints, SafeArea, SubtitleLayout,
    SubtitleSegment, positive_or,
};
use crate::ui::prelude::*;

/// Input document of the `timeline` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineRequest {
    pub segments: Vec<SubtitleSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<SubtitleStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_strategy: Option<PlacementStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_placement: Option<Placement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars_per_line: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_strategy: Option<OverflowStrategy>,
    /// Empty or unknown names mean no preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_preset: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emphasis_phrases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creativity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<LayoutConstraints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_rules: Option<DynamicRules>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_area: Option<SafeArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_hints: Option<RenderHints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_line_seconds: Option<f64>,
}

impl TimelineRequest {
    pub fn from_segments(segments: Vec<SubtitleSegment>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }
}

/// Every knob of one run, with all fallbacks applied.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub style: SubtitleStyle,
    pub preset: Option<DirectionPreset>,
    pub layout: SubtitleLayout,
    pub min_line_seconds: f64,
    pub direction: DirectionRequest,
    pub theme_name: Option<String>,
}

/// Request values first, then the config, then built-in defaults. TRAILER
/// always renders a single line.
pub fn resolve_settings(request: &TimelineRequest, config: &DirectorConfig) -> ResolvedSettings {
    let style = request.style.unwrap_or_default();
    let preset = resolve_preset(request.direction_preset.as_deref());
    let placement_strategy = request.placement_strategy.unwrap_or_default();
    let default_placement = request.default_placement.unwrap_or_default();

    let max_chars_per_line = positive_or(request.max_chars_per_line, config.max_chars_per_line);
    let max_lines = style_preset(style)
        .max_lines
        .unwrap_or_else(|| positive_or(request.max_lines, config.max_lines));
    let overflow_strategy = request.overflow_strategy.unwrap_or(config.overflow_strategy);

    let mut constraints = request.constraints.unwrap_or_default();
    if constraints.long_sentence_chars.is_none() {
        constraints.long_sentence_chars = Some(config.long_sentence_chars);
    }
    let dynamic_rules = request.dynamic_rules.unwrap_or_else(|| config.dynamic_rules());

    let min_line_seconds = request
        .min_line_seconds
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .unwrap_or(config.min_line_seconds);

    let layout = SubtitleLayout {
        placement_strategy,
        default_placement,
        max_lines,
        max_chars_per_line,
        overflow_strategy,
        constraints: Some(constraints),
        safe_area: request.safe_area,
        dynamic_rules: match placement_strategy {
            PlacementStrategy::Dynamic => Some(dynamic_rules),
            PlacementStrategy::Fixed => request.dynamic_rules,
        },
    };

    let direction = DirectionRequest {
        style,
        preset,
        placement_strategy,
        default_placement,
        emphasis_phrases: request
            .emphasis_phrases
            .iter()
            .map(|phrase| phrase.trim().to_string())
            .filter(|phrase| !phrase.is_empty())
            .collect(),
        duration_sec: 0.0,
        creativity: request.creativity,
        fallback_creativity: config.creativity,
        constraints,
        dynamic_rules,
    };

    ResolvedSettings {
        style,
        preset,
        layout,
        min_line_seconds,
        direction,
        theme_name: request.theme.clone().or_else(|| Some(config.theme.clone())),
    }
}

/// Split one segment into lines, using word timing when present.
pub fn split_segment(segment: &mut SubtitleSegment, settings: &ResolvedSettings) {
    let layout = &settings.layout;
    segment.lines = if segment.words.is_empty() {
        split(
            &segment.text,
            segment.start,
            segment.end,
            layout.max_chars_per_line,
            layout.max_lines,
            layout.overflow_strategy,
        )
    } else {
        split_with_word_timing(
            &segment.text,
            segment.start,
            segment.end,
            &segment.words,
            layout.max_chars_per_line,
            layout.max_lines,
            layout.overflow_strategy,
            settings.min_line_seconds,
        )
    };
}

/// Run the full pipeline over one request.
pub fn build_timeline(request: TimelineRequest, config: &DirectorConfig) -> TimelineResponse {
    let mut settings = resolve_settings(&request, config);
    emit(
        Level::Debug,
        "timeline.pipeline.start",
        &format!(
            "Building timeline for {} segments ({} / {})",
            request.segments.len(),
            settings.style,
            settings.layout.placement_strategy
        ),
        Some(json!({
            "segments": request.segments.len(),
            "maxCharsPerLine": settings.layout.max_chars_per_line,
            "maxLines": settings.layout.max_lines,
            "preset": settings.preset.map(|p| p.as_str()),
        })),
    );

    let input_count = request.segments.len();
    let mut segments: Vec<SubtitleSegment> = request
        .segments
        .into_iter()
        .filter_map(|mut segment| {
            segment.normalize_timing();
            segment.text = normalize_text(&segment.text);
            if segment.text.is_empty() {
                return None;
            }
            split_segment(&mut segment, &settings);
            Some(segment)
        })
        .collect();

    if segments.len() < input_count {
        emit(
            Level::Debug,
            "timeline.pipeline.empty_segments",
            &format!("Skipped {} empty segments", input_count - segments.len()),
            None,
        );
    }

    let audio = request.audio.unwrap_or_default();
    let last_end = segments.iter().map(|s| s.end).fold(0.0, f64::max);
    settings.direction.duration_sec = audio.duration_seconds.max(last_end);

    segments = build_direction(segments, &settings.direction);
    emit(
        Level::Debug,
        "timeline.pipeline.directed",
        &format!(
            "Directed {} segments ({} centered)",
            segments.len(),
            segments
                .iter()
                .filter(|s| s.placement == Some(Placement::Center))
                .count()
        ),
        Some(json!({ "durationSec": settings.direction.duration_sec })),
    );

    let theme = resolve_theme(settings.theme_name.as_deref());
    let timeline = assemble(
        segments,
        settings.layout,
        audio,
        settings.style,
        settings.preset,
        Some(theme),
        request.render_hints,
    );

    emit(
        Level::Debug,
        "timeline.pipeline.done",
        &format!(
            "Timeline {} has {} scenes and {} lines over {:.2}s",
            timeline.timeline_id,
            timeline.scenes.len(),
            timeline.line_count(),
            timeline.duration_seconds
        ),
        None,
    );
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::style::SubtitleSize;
    use crate::subtitles::types::SubtitleWord;

    fn texts(timeline: &TimelineResponse, scene: usize) -> Vec<&str> {
        timeline.scenes[scene]
            .subtitle
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect()
    }

    #[test]
    fn hello_world_scenario() {
        let request = TimelineRequest {
            max_chars_per_line: Some(10),
            max_lines: Some(3),
            overflow_strategy: Some(OverflowStrategy::RebalanceThenShrink),
            ..TimelineRequest::from_segments(vec![SubtitleSegment::new(
                "Hello world this is a test",
                0.0,
                3.0,
            )])
        };
        let timeline = build_timeline(request, &DirectorConfig::default());

        let lines = &timeline.scenes[0].subtitle.lines;
        assert!(lines.len() <= 3);
        assert!(lines.iter().all(|line| line.text.chars().count() <= 10));
        assert_eq!(texts(&timeline, 0).join(" "), "Hello world this is a test");
        assert_eq!(lines.last().unwrap().end, 3.0);
        assert_eq!(timeline.duration_seconds, 3.0);
    }

    #[test]
    fn word_timing_scenario() {
        let segment = SubtitleSegment::new("Hi there", 0.0, 0.8).with_words(vec![
            SubtitleWord::new("Hi", 0.0, 0.3),
            SubtitleWord::new("there", 0.3, 0.8),
        ]);
        let request = TimelineRequest {
            min_line_seconds: Some(0.35),
            ..TimelineRequest::from_segments(vec![segment])
        };
        let timeline = build_timeline(request, &DirectorConfig::default());

        let lines = &timeline.scenes[0].subtitle.lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].start, 0.0);
        assert!(lines[0].end >= 0.35 && lines[0].end <= 0.8);
    }

    #[test]
    fn trailer_forces_single_line() {
        let request = TimelineRequest {
            style: Some(SubtitleStyle::Trailer),
            max_lines: Some(3),
            max_chars_per_line: Some(8),
            ..TimelineRequest::from_segments(vec![SubtitleSegment::new(
                "one two three four five",
                0.0,
                2.0,
            )])
        };
        let timeline = build_timeline(request, &DirectorConfig::default());
        assert_eq!(timeline.subtitle_layout.max_lines, 1);
        assert_eq!(texts(&timeline, 0), vec!["one two three four five"]);
        assert_eq!(timeline.scenes[0].subtitle.size, SubtitleSize::Xl);
    }

    #[test]
    fn non_positive_limits_fall_back_to_config() {
        let config = DirectorConfig {
            max_chars_per_line: 20,
            max_lines: 2,
            ..DirectorConfig::default()
        };
        let request = TimelineRequest {
            max_chars_per_line: Some(0),
            max_lines: Some(-3),
            ..TimelineRequest::from_segments(vec![SubtitleSegment::new("x", 0.0, 1.0)])
        };
        let settings = resolve_settings(&request, &config);
        assert_eq!(settings.layout.max_chars_per_line, 20);
        assert_eq!(settings.layout.max_lines, 2);
    }

    #[test]
    fn malformed_segments_are_clamped_or_dropped() {
        let request = TimelineRequest::from_segments(vec![
            SubtitleSegment::new("backwards", 2.0, 1.0),
            SubtitleSegment::new("   ", 3.0, 4.0),
        ]);
        let timeline = build_timeline(request, &DirectorConfig::default());
        assert_eq!(timeline.scenes.len(), 1);
        assert_eq!(timeline.scenes[0].start, 2.0);
        assert_eq!(timeline.scenes[0].end, 2.0);
        assert_eq!(timeline.scenes[0].subtitle.lines[0].end, 2.0);
    }

    #[test]
    fn dynamic_request_gets_rules_and_safe_area() {
        let request: TimelineRequest = serde_json::from_str(
            r#"{
                "segments": [
                    {"text": "This is the big secret", "start": 0.0, "end": 2.0},
                    {"text": "and nothing else", "start": 2.0, "end": 4.0}
                ],
                "placementStrategy": "DYNAMIC",
                "directionPreset": "CINEMATIC_DYNAMIC_V1",
                "emphasisPhrases": ["big secret"],
                "creativity": 1.0,
                "theme": "neon"
            }"#,
        )
        .unwrap();
        let timeline = build_timeline(request, &DirectorConfig::default());

        assert_eq!(timeline.scenes[0].subtitle.placement, Placement::Center);
        assert_eq!(timeline.scenes[1].subtitle.placement, Placement::Bottom);
        assert_eq!(timeline.subtitle_layout.safe_area, Some(SafeArea::DYNAMIC_DEFAULT));
        assert_eq!(timeline.subtitle_layout.dynamic_rules, Some(DynamicRules::default()));
        assert_eq!(timeline.direction_preset, Some(DirectionPreset::CinematicDynamicV1));
        let emphasis = timeline.scenes[0].subtitle.emphasis.as_ref().unwrap();
        assert_eq!(emphasis.color.as_deref(), Some("#39ff14"));
    }

    #[test]
    fn short_timeline_keeps_full_placement_hold() {
        let segments = (0..8)
            .map(|i| {
                let text = if i % 2 == 0 { "big win" } else { "plain words" };
                let start = i as f64 * 0.5;
                SubtitleSegment::new(text, start, start + 0.5)
            })
            .collect();
        let rules = DynamicRules {
            min_seconds_between_placement_changes: 2.0,
            max_center_blocks_in_row: 5,
        };
        let request = TimelineRequest {
            placement_strategy: Some(PlacementStrategy::Dynamic),
            emphasis_phrases: vec!["big win".to_string()],
            creativity: Some(1.0),
            dynamic_rules: Some(rules),
            ..TimelineRequest::from_segments(segments)
        };
        let timeline = build_timeline(request, &DirectorConfig::default());
        assert_eq!(timeline.duration_seconds, 4.0);
        assert_eq!(timeline.subtitle_layout.dynamic_rules, Some(rules));

        let placements: Vec<Placement> = timeline
            .scenes
            .iter()
            .map(|scene| scene.subtitle.placement)
            .collect();
        use Placement::{Bottom, Center};
        assert_eq!(
            placements,
            vec![Center, Center, Center, Center, Center, Bottom, Bottom, Bottom]
        );

        let mut last_change: Option<f64> = None;
        for pair in timeline.scenes.windows(2) {
            if pair[0].subtitle.placement != pair[1].subtitle.placement {
                if let Some(previous) = last_change {
                    assert!(pair[1].start - previous >= 2.0);
                }
                last_change = Some(pair[1].start);
            }
        }
    }

    #[test]
    fn unknown_enum_strings_fall_back() {
        let request: TimelineRequest = serde_json::from_str(
            r#"{"segments": [{"text": "hi", "start": 0, "end": 1}],
                "style": "COMIC", "defaultPlacement": "LEFT", "directionPreset": ""}"#,
        )
        .unwrap();
        let timeline = build_timeline(request, &DirectorConfig::default());
        assert_eq!(timeline.subtitle_style, SubtitleStyle::LineByLine);
        assert_eq!(timeline.scenes[0].subtitle.placement, Placement::Bottom);
        assert_eq!(timeline.direction_preset, None);
    }
}
