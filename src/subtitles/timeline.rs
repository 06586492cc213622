//! Timeline assembly: a structural merge of directed segments into the
//! versioned scene document consumed by renderers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::presets::{Theme, ThemeSpec, default_theme};
use super::style::{
    Animation, DirectionPreset, Placement, PlacementStrategy, SubtitleSize, SubtitleStyle,
    VisualKind,
};
use super::types::{
    AudioTrack, Emphasis, RenderHints, SafeArea, SceneSubtitleLine, SubtitleLayout,
    SubtitleSegment,
};

pub const SUBTITLE_SCHEMA_VERSION: u32 = 1;
pub const TIMELINE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneVoice {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSubtitle {
    pub placement: Placement,
    pub animation: Animation,
    pub size: SubtitleSize,
    pub lines: Vec<SceneSubtitleLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneVisual {
    pub kind: VisualKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl SceneVisual {
    /// Video wins over image when both are present.
    pub fn from_urls(image_url: Option<String>, video_url: Option<String>) -> Self {
        let kind = match (&image_url, &video_url) {
            (_, Some(_)) => VisualKind::Video,
            (Some(_), None) => VisualKind::Image,
            (None, None) => VisualKind::None,
        };
        Self {
            kind,
            image_url,
            video_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayout {
    pub max_lines: usize,
    pub max_chars_per_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_area: Option<SafeArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(rename = "sceneID")]
    pub scene_id: String,
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub voice: SceneVoice,
    pub subtitle: SceneSubtitle,
    pub visual: SceneVisual,
    pub layout: SceneLayout,
}

impl Scene {
    pub fn scene_id_for(index: usize) -> String {
        format!("scene_{index}")
    }

    pub fn set_image(&mut self, url: impl Into<String>) {
        self.visual = SceneVisual::from_urls(Some(url.into()), self.visual.video_url.take());
    }

    pub fn set_video(&mut self, url: impl Into<String>) {
        self.visual = SceneVisual::from_urls(self.visual.image_url.take(), Some(url.into()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub subtitle_schema_version: u32,
    #[serde(rename = "timelineID")]
    pub timeline_id: String,
    pub version: u32,
    pub subtitle_style: SubtitleStyle,
    pub subtitle_layout: SubtitleLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_hints: Option<RenderHints>,
    pub audio: AudioTrack,
    pub scenes: Vec<Scene>,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_preset: Option<DirectionPreset>,
}

impl TimelineResponse {
    pub fn line_count(&self) -> usize {
        self.scenes.iter().map(|scene| scene.subtitle.lines.len()).sum()
    }
}

pub fn new_timeline_id() -> String {
    format!("tl_{}", Uuid::new_v4())
}

/// Safe area stored on the layout: the explicit value, else the dynamic
/// default for DYNAMIC layouts, else none.
pub fn effective_safe_area(layout: &SubtitleLayout) -> Option<SafeArea> {
    match (layout.safe_area, layout.placement_strategy) {
        (Some(area), _) => Some(area.clamped()),
        (None, PlacementStrategy::Dynamic) => Some(SafeArea::DYNAMIC_DEFAULT),
        (None, PlacementStrategy::Fixed) => None,
    }
}

fn fill_color(emphasis: &mut Option<Emphasis>, accent: &str) {
    if let Some(emphasis) = emphasis
        && emphasis.color.is_none()
    {
        emphasis.color = Some(accent.to_string());
    }
}

/// Merge directed segments, layout and audio into a timeline. Scenes are
/// ordered by start time; render hints are carried, never applied.
pub fn assemble(
    mut segments: Vec<SubtitleSegment>,
    mut layout: SubtitleLayout,
    audio: AudioTrack,
    style: SubtitleStyle,
    preset: Option<DirectionPreset>,
    theme: Option<&Theme>,
    render_hints: Option<RenderHints>,
) -> TimelineResponse {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    layout.safe_area = effective_safe_area(&layout);
    let theme = theme.unwrap_or_else(|| default_theme());

    let scenes: Vec<Scene> = segments
        .into_iter()
        .enumerate()
        .map(|(index, mut segment)| {
            fill_color(&mut segment.emphasis, theme.accent_color);
            for line in &mut segment.lines {
                fill_color(&mut line.emphasis, theme.accent_color);
            }

            Scene {
                scene_id: Scene::scene_id_for(index),
                index,
                start: segment.start,
                end: segment.end,
                duration: segment.duration(),
                voice: SceneVoice {
                    text: segment.text,
                    voice: audio.voice.clone(),
                },
                subtitle: SceneSubtitle {
                    placement: segment.placement.unwrap_or(layout.default_placement),
                    animation: segment.animation.unwrap_or_default(),
                    size: segment.size.unwrap_or_default(),
                    lines: segment.lines,
                    emphasis: segment.emphasis,
                },
                visual: SceneVisual::from_urls(segment.image_url, segment.video_url),
                layout: SceneLayout {
                    max_lines: layout.max_lines,
                    max_chars_per_line: layout.max_chars_per_line,
                    safe_area: layout.safe_area,
                },
            }
        })
        .collect();

    let last_end = scenes.iter().map(|scene| scene.end).fold(0.0, f64::max);
    let audio_duration = if audio.duration_seconds.is_finite() {
        audio.duration_seconds.max(0.0)
    } else {
        0.0
    };

    TimelineResponse {
        subtitle_schema_version: SUBTITLE_SCHEMA_VERSION,
        timeline_id: new_timeline_id(),
        version: TIMELINE_VERSION,
        subtitle_style: style,
        subtitle_layout: layout,
        render_hints,
        duration_seconds: audio_duration.max(last_end),
        audio,
        scenes,
        theme: Some(ThemeSpec::from(theme)),
        direction_preset: preset,
    }
}
