//! Style, direction and theme presets.
//!
//! Presets are plain data. The director and assembler look them up; none of
//! them carries behaviour of its own.

use serde::{Deserialize, Serialize};

use crate::ui::catppuccin::{colors, latte};

use super::style::{Animation, DirectionPreset, Placement, SubtitleSize, SubtitleStyle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePreset {
    pub style: SubtitleStyle,
    pub size: SubtitleSize,
    /// Hard line budget imposed by the style, overriding the request.
    pub max_lines: Option<usize>,
    pub description: &'static str,
}

const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        style: SubtitleStyle::LineByLine,
        size: SubtitleSize::M,
        max_lines: None,
        description: "Plain lines, one after another",
    },
    StylePreset {
        style: SubtitleStyle::LineByLineBig,
        size: SubtitleSize::L,
        max_lines: None,
        description: "Plain lines in a larger size",
    },
    StylePreset {
        style: SubtitleStyle::AlexHormozi,
        size: SubtitleSize::Xl,
        max_lines: None,
        description: "Punchy oversized captions that pop in",
    },
    StylePreset {
        style: SubtitleStyle::Trailer,
        size: SubtitleSize::Xl,
        max_lines: Some(1),
        description: "Single oversized line per beat",
    },
    StylePreset {
        style: SubtitleStyle::CinematicDynamic,
        size: SubtitleSize::L,
        max_lines: None,
        description: "Large captions meant for dynamic placement",
    },
];

pub fn style_preset(style: SubtitleStyle) -> &'static StylePreset {
    STYLE_PRESETS
        .iter()
        .find(|preset| preset.style == style)
        .unwrap_or(&STYLE_PRESETS[0])
}

pub fn style_presets() -> &'static [StylePreset] {
    STYLE_PRESETS
}

/// Parameter bundle selected by a [`DirectionPreset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionProfile {
    pub preset: DirectionPreset,
    pub creativity: f64,
    pub default_animation: Animation,
    pub center_animation: Animation,
    pub edge_size: SubtitleSize,
    pub center_size: SubtitleSize,
    pub description: &'static str,
}

impl DirectionProfile {
    pub fn size_for(&self, placement: Placement) -> SubtitleSize {
        match placement {
            Placement::Center => self.center_size,
            Placement::Top | Placement::Bottom => self.edge_size,
        }
    }

    pub fn animation_for(&self, placement: Placement) -> Animation {
        match placement {
            Placement::Center => self.center_animation,
            Placement::Top | Placement::Bottom => self.default_animation,
        }
    }
}

const DIRECTION_PROFILES: &[DirectionProfile] = &[
    DirectionProfile {
        preset: DirectionPreset::CinematicDynamicV1,
        creativity: 0.7,
        default_animation: Animation::FadeIn,
        center_animation: Animation::Pop,
        edge_size: SubtitleSize::L,
        center_size: SubtitleSize::Xl,
        description: "Moves emphasized beats to the center",
    },
    DirectionProfile {
        preset: DirectionPreset::TrailerV1,
        creativity: 1.0,
        default_animation: Animation::SlideUp,
        center_animation: Animation::Pop,
        edge_size: SubtitleSize::Xl,
        center_size: SubtitleSize::Xl,
        description: "Every emphasized beat takes the center",
    },
    DirectionProfile {
        preset: DirectionPreset::Documentary,
        creativity: 0.2,
        default_animation: Animation::FadeIn,
        center_animation: Animation::FadeIn,
        edge_size: SubtitleSize::M,
        center_size: SubtitleSize::L,
        description: "Calm lower thirds, center only for fully emphasized lines",
    },
];

pub fn direction_profile(preset: DirectionPreset) -> &'static DirectionProfile {
    DIRECTION_PROFILES
        .iter()
        .find(|profile| profile.preset == preset)
        .unwrap_or(&DIRECTION_PROFILES[0])
}

pub fn direction_profiles() -> &'static [DirectionProfile] {
    DIRECTION_PROFILES
}

/// Named color set applied uniformly to a timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub accent_color: &'static str,
    pub text_color: &'static str,
    pub outline_color: &'static str,
}

pub const DEFAULT_THEME: &str = "CATPPUCCIN_MOCHA";

const THEMES: &[Theme] = &[
    Theme {
        name: "CATPPUCCIN_MOCHA",
        accent_color: colors::MAUVE,
        text_color: colors::TEXT,
        outline_color: colors::CRUST,
    },
    Theme {
        name: "CATPPUCCIN_LATTE",
        accent_color: latte::MAUVE,
        text_color: latte::TEXT,
        outline_color: latte::CRUST,
    },
    Theme {
        name: "CLASSIC",
        accent_color: "#ffd400",
        text_color: "#ffffff",
        outline_color: "#000000",
    },
    Theme {
        name: "NEON",
        accent_color: "#39ff14",
        text_color: "#f8f8f2",
        outline_color: "#14001f",
    },
];

pub fn themes() -> &'static [Theme] {
    THEMES
}

pub fn theme_by_name(name: &str) -> Option<&'static Theme> {
    let normalized = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
    THEMES.iter().find(|theme| theme.name == normalized)
}

/// Unknown or missing theme names fall back to [`DEFAULT_THEME`].
pub fn resolve_theme(name: Option<&str>) -> &'static Theme {
    name.and_then(theme_by_name).unwrap_or_else(default_theme)
}

pub fn default_theme() -> &'static Theme {
    &THEMES[0]
}

/// Serializable copy of a theme, embedded in the timeline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSpec {
    pub name: String,
    pub accent_color: String,
    pub text_color: String,
    pub outline_color: String,
}

impl From<&Theme> for ThemeSpec {
    fn from(theme: &Theme) -> Self {
        Self {
            name: theme.name.to_string(),
            accent_color: theme.accent_color.to_string(),
            text_color: theme.text_color.to_string(),
            outline_color: theme.outline_color.to_string(),
        }
    }
}
