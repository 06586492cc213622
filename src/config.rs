use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::subtitles::direction::DEFAULT_CREATIVITY;
use crate::subtitles::presets::{DEFAULT_THEME, theme_by_name};
use crate::subtitles::style::OverflowStrategy;
use crate::subtitles::types::{
    DEFAULT_LONG_SENTENCE_CHARS, DEFAULT_MAX_CHARS_PER_LINE, DEFAULT_MAX_LINES,
    DEFAULT_MIN_LINE_SECONDS, DynamicRules,
};

/// Get the subdirector config directory
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("subdirector"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Defaults applied to every request that leaves a value unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Line width in characters
    pub max_chars_per_line: usize,
    /// Line budget per segment
    pub max_lines: usize,
    /// Minimum on-screen time for word-timed lines, in seconds
    pub min_line_seconds: f64,
    pub overflow_strategy: OverflowStrategy,
    /// Segments longer than this never go to the center
    pub long_sentence_chars: usize,
    /// Emphasis aggressiveness (0.0-1.0) when neither request nor preset sets one
    pub creativity: f64,
    /// Theme name, e.g. CATPPUCCIN_MOCHA or NEON
    pub theme: String,
    /// Concurrent media attachment tasks
    pub media_concurrency: usize,
    pub min_seconds_between_placement_changes: f64,
    pub max_center_blocks_in_row: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        let rules = DynamicRules::default();
        Self {
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            max_lines: DEFAULT_MAX_LINES,
            min_line_seconds: DEFAULT_MIN_LINE_SECONDS,
            overflow_strategy: OverflowStrategy::default(),
            long_sentence_chars: DEFAULT_LONG_SENTENCE_CHARS,
            creativity: DEFAULT_CREATIVITY,
            theme: DEFAULT_THEME.to_string(),
            media_concurrency: Self::DEFAULT_MEDIA_CONCURRENCY,
            min_seconds_between_placement_changes: rules.min_seconds_between_placement_changes,
            max_center_blocks_in_row: rules.max_center_blocks_in_row,
        }
    }
}

impl DirectorConfig {
    pub const DEFAULT_MEDIA_CONCURRENCY: usize = 4;

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_from_path(config_path()?),
        }
    }

    /// Missing files are created with defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, toml).with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.max_chars_per_line == 0 {
            self.max_chars_per_line = defaults.max_chars_per_line;
        }
        if self.max_lines == 0 {
            self.max_lines = defaults.max_lines;
        }
        if !self.min_line_seconds.is_finite() || self.min_line_seconds <= 0.0 {
            self.min_line_seconds = defaults.min_line_seconds;
        }
        if self.long_sentence_chars == 0 {
            self.long_sentence_chars = defaults.long_sentence_chars;
        }
        self.creativity = if self.creativity.is_finite() {
            self.creativity.clamp(0.0, 1.0)
        } else {
            defaults.creativity
        };
        if theme_by_name(&self.theme).is_none() {
            self.theme = defaults.theme;
        }
        if self.media_concurrency == 0 {
            self.media_concurrency = defaults.media_concurrency;
        }
        if !self.min_seconds_between_placement_changes.is_finite()
            || self.min_seconds_between_placement_changes < 0.0
        {
            self.min_seconds_between_placement_changes =
                defaults.min_seconds_between_placement_changes;
        }
        self
    }

    pub fn dynamic_rules(&self) -> DynamicRules {
        DynamicRules {
            min_seconds_between_placement_changes: self.min_seconds_between_placement_changes,
            max_center_blocks_in_row: self.max_center_blocks_in_row,
        }
    }
}
