//! ASS (Advanced SubStation Alpha) export of a timeline.
//!
//! Each placement gets its own style (alignment plus margins derived from the
//! safe area). Every subtitle line becomes one dialogue event carrying inline
//! overrides for size, entry animation and emphasis colors. Render hints are
//! applied here and nowhere else.

use std::fmt::{self, Write};

use crate::ui::catppuccin::hex_to_ass_color;

use super::emphasis::find_ignore_case;
use super::presets::{ThemeSpec, default_theme};
use super::style::{Animation, Placement, SubtitleSize};
use super::timeline::{Scene, TimelineResponse};
use super::types::{RenderHints, SafeArea, SceneSubtitleLine};

/// Vertical 9:16 output, the common target for short-form video.
pub const DEFAULT_PLAY_RES: (u32, u32) = (1080, 1920);

/// ASS subtitle animation constants
mod ass_constants {
    /// Fade-in duration in milliseconds
    pub const FADE_IN_MS: u32 = 150;
    /// Pop: start scale in percent and the time to reach 100%
    pub const POP_START_SCALE: u32 = 80;
    pub const POP_DURATION_MS: u32 = 120;
    /// Slide-up: vertical travel in pixels and duration
    pub const SLIDE_DISTANCE_PX: u32 = 40;
    pub const SLIDE_DURATION_MS: u32 = 180;
    /// Shadow alpha (0x99 = 60% opacity)
    pub const BACK_ALPHA: u8 = 0x99;
}

/// Style configuration for one placement.
#[derive(Debug, Clone)]
pub struct AssStyle {
    /// Style name, referenced by dialogue events
    pub name: String,
    pub font_name: String,
    /// Font size in pixels
    pub font_size: u32,
    /// Primary color in ABGR format (e.g., &H00FFFFFF for white)
    pub primary_color: String,
    /// Outline color in ABGR format
    pub outline_color: String,
    /// Background/shadow color in ABGR format
    pub back_color: String,
    pub bold: bool,
    /// Outline width in pixels
    pub outline: u32,
    /// Shadow depth in pixels
    pub shadow: u32,
    /// Alignment (numpad layout: 1-3=bottom, 4-6=mid, 7-9=top)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    /// Distance from the anchored edge; unused for middle alignment
    pub margin_v: u32,
}

impl AssStyle {
    /// Format the style line for the ASS file.
    fn to_style_line(&self) -> String {
        let bold_val = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{primary},{outline},{back},{bold},0,0,0,100,100,0,0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            outline = self.outline_color,
            back = self.back_color,
            bold = bold_val,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }

    /// Pixel position of the text anchor, used by positional animations.
    fn anchor(&self, play_res: (u32, u32)) -> (u32, u32) {
        let (width, height) = play_res;
        let usable = width.saturating_sub(self.margin_l + self.margin_r);
        let x = self.margin_l + usable / 2;
        let y = match self.alignment {
            7..=9 => self.margin_v,
            4..=6 => height / 2,
            _ => height.saturating_sub(self.margin_v),
        };
        (x, y)
    }
}

#[derive(Debug, Clone)]
pub struct AssOptions {
    pub play_res: (u32, u32),
    pub font_name: String,
}

impl Default for AssOptions {
    fn default() -> Self {
        Self {
            play_res: DEFAULT_PLAY_RES,
            font_name: "Inter".to_string(),
        }
    }
}

/// Numpad alignment of a placement.
pub fn alignment_for(placement: Placement) -> u8 {
    match placement {
        Placement::Top => 8,
        Placement::Center => 5,
        Placement::Bottom => 2,
    }
}

/// Font size in pixels, scaled from a 1080px short edge.
pub fn font_size_for(size: SubtitleSize, play_res: (u32, u32)) -> u32 {
    let base = match size {
        SubtitleSize::S => 40.0,
        SubtitleSize::M => 52.0,
        SubtitleSize::L => 64.0,
        SubtitleSize::Xl => 80.0,
    };
    let short_edge = play_res.0.min(play_res.1).max(1) as f64;
    (base * short_edge / 1080.0).round() as u32
}

fn style_name(placement: Placement) -> &'static str {
    match placement {
        Placement::Top => "Top",
        Placement::Center => "Center",
        Placement::Bottom => "Bottom",
    }
}

fn build_style(
    placement: Placement,
    theme: &ThemeSpec,
    safe_area: SafeArea,
    options: &AssOptions,
) -> AssStyle {
    let (width, height) = options.play_res;
    let scale = |fraction: f64, total: u32| (fraction * total as f64).round() as u32;
    let fallback = default_theme();

    AssStyle {
        name: style_name(placement).to_string(),
        font_name: options.font_name.clone(),
        font_size: font_size_for(SubtitleSize::M, options.play_res),
        primary_color: hex_to_ass_color(&theme.text_color, 0)
            .or_else(|| hex_to_ass_color(fallback.text_color, 0))
            .unwrap_or_else(|| "&H00FFFFFF".to_string()),
        outline_color: hex_to_ass_color(&theme.outline_color, 0)
            .or_else(|| hex_to_ass_color(fallback.outline_color, 0))
            .unwrap_or_else(|| "&H00000000".to_string()),
        back_color: hex_to_ass_color(&theme.outline_color, ass_constants::BACK_ALPHA)
            .unwrap_or_else(|| "&H99000000".to_string()),
        bold: true,
        outline: 3,
        shadow: 1,
        alignment: alignment_for(placement),
        margin_l: scale(safe_area.left, width),
        margin_r: scale(safe_area.right, width),
        margin_v: match placement {
            Placement::Top => scale(safe_area.top, height),
            Placement::Bottom => scale(safe_area.bottom, height),
            Placement::Center => 0,
        },
    }
}

/// Event timing after render hints. The offset shifts every line; the
/// extension only lengthens the last line of a scene.
pub fn hinted_interval(
    line: &SceneSubtitleLine,
    is_last: bool,
    hints: Option<&RenderHints>,
) -> (f64, f64) {
    let finite = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
    let offset = finite(hints.and_then(|h| h.timing_offset_seconds));
    let extend = if is_last {
        finite(hints.and_then(|h| h.extend_end_seconds)).max(0.0)
    } else {
        0.0
    };

    let start = (line.start + offset).max(0.0);
    let end = (line.end + offset + extend).max(start);
    (start, end)
}

/// Generate the complete ASS file content for a timeline.
pub fn generate_ass(timeline: &TimelineResponse, options: &AssOptions) -> Result<String, fmt::Error> {
    let theme = timeline
        .theme
        .clone()
        .unwrap_or_else(|| ThemeSpec::from(default_theme()));
    let safe_area = timeline
        .subtitle_layout
        .safe_area
        .map(SafeArea::clamped)
        .unwrap_or(SafeArea {
            top: 0.06,
            bottom: 0.06,
            left: 0.05,
            right: 0.05,
        });
    let styles: Vec<(Placement, AssStyle)> = Placement::ALL
        .iter()
        .map(|placement| (*placement, build_style(*placement, &theme, safe_area, options)))
        .collect();

    let mut output = String::new();

    writeln!(output, "[Script Info]")?;
    writeln!(output, "; Generated by subdirector")?;
    writeln!(output, "; Timeline: {}", timeline.timeline_id)?;
    writeln!(output, "ScriptType: v4.00+")?;
    writeln!(output, "PlayResX: {}", options.play_res.0)?;
    writeln!(output, "PlayResY: {}", options.play_res.1)?;
    writeln!(output, "WrapStyle: 0")?;
    writeln!(output, "ScaledBorderAndShadow: yes")?;
    writeln!(output)?;

    writeln!(output, "[V4+ Styles]")?;
    writeln!(
        output,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    )?;
    for (_, style) in &styles {
        writeln!(output, "{}", style.to_style_line())?;
    }
    writeln!(output)?;

    writeln!(output, "[Events]")?;
    writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )?;

    for scene in &timeline.scenes {
        let style = styles
            .iter()
            .find(|(placement, _)| *placement == scene.subtitle.placement)
            .map(|(_, style)| style)
            .unwrap_or(&styles[0].1);
        write_scene_events(&mut output, scene, style, &theme, timeline.render_hints.as_ref(), options)?;
    }

    Ok(output)
}

fn write_scene_events(
    output: &mut String,
    scene: &Scene,
    style: &AssStyle,
    theme: &ThemeSpec,
    hints: Option<&RenderHints>,
    options: &AssOptions,
) -> fmt::Result {
    let accent = scene
        .subtitle
        .emphasis
        .as_ref()
        .and_then(|e| e.color.as_deref())
        .unwrap_or(&theme.accent_color);

    let count = scene.subtitle.lines.len();
    for (idx, line) in scene.subtitle.lines.iter().enumerate() {
        let (start, end) = hinted_interval(line, idx + 1 == count, hints);
        let mut text = String::new();

        write!(text, "{{\\fs{}", font_size_for(line.size, options.play_res))?;
        write_animation(&mut text, scene.subtitle.animation, style, options.play_res)?;
        text.push('}');

        let line_accent = line
            .emphasis
            .as_ref()
            .and_then(|e| e.color.as_deref())
            .unwrap_or(accent);
        let phrases = line
            .emphasis
            .as_ref()
            .map(|e| e.phrases.as_slice())
            .unwrap_or(&[]);

        if scene.subtitle.animation == Animation::Typewriter {
            write_typewriter(&mut text, &line.text, end - start)?;
        } else {
            write_emphasized(&mut text, &line.text, phrases, line_accent, style)?;
        }

        writeln!(
            output,
            "Dialogue: 0,{start},{end},{style},,0,0,0,,{text}",
            start = format_ass_timestamp(start),
            end = format_ass_timestamp(end),
            style = style.name,
        )?;
    }
    Ok(())
}

fn write_animation(
    text: &mut String,
    animation: Animation,
    style: &AssStyle,
    play_res: (u32, u32),
) -> fmt::Result {
    use ass_constants::*;

    match animation {
        Animation::FadeIn => write!(text, "\\fad({FADE_IN_MS},0)"),
        Animation::Pop => write!(
            text,
            "\\fscx{POP_START_SCALE}\\fscy{POP_START_SCALE}\\t(0,{POP_DURATION_MS},\\fscx100\\fscy100)"
        ),
        Animation::SlideUp => {
            let (x, y) = style.anchor(play_res);
            write!(
                text,
                "\\move({x},{from},{x},{y},0,{SLIDE_DURATION_MS})\\fad({FADE_IN_MS},0)",
                from = y + SLIDE_DISTANCE_PX
            )
        }
        // Typewriter timing lives in per-word karaoke tags
        Animation::Typewriter => Ok(()),
    }
}

/// Write `line` with every emphasized phrase switched to the accent color.
fn write_emphasized(
    text: &mut String,
    line: &str,
    phrases: &[String],
    accent_hex: &str,
    style: &AssStyle,
) -> fmt::Result {
    let Some(accent) = hex_to_ass_color(accent_hex, 0) else {
        text.push_str(&escape_ass_text(line));
        return Ok(());
    };

    let mut ranges: Vec<std::ops::Range<usize>> = phrases
        .iter()
        .filter_map(|phrase| find_ignore_case(line, phrase))
        .collect();
    ranges.sort_by_key(|range| range.start);

    let mut cursor = 0;
    for range in ranges {
        if range.start < cursor {
            continue;
        }
        text.push_str(&escape_ass_text(&line[cursor..range.start]));
        write!(
            text,
            "{{\\1c{accent}&}}{}{{\\1c{}&}}",
            escape_ass_text(&line[range.clone()]),
            style.primary_color
        )?;
        cursor = range.end;
    }
    text.push_str(&escape_ass_text(&line[cursor..]));
    Ok(())
}

/// Reveal words one after another with karaoke fill tags spread evenly over
/// the line duration.
fn write_typewriter(text: &mut String, line: &str, duration: f64) -> fmt::Result {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(());
    }
    let total_cs = (duration.max(0.0) * 100.0).round() as u64;
    let per_word = total_cs / words.len() as u64;

    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            text.push(' ');
        }
        write!(text, "{{\\k{per_word}}}{}", escape_ass_text(word))?;
    }
    Ok(())
}

/// Format seconds as an ASS timestamp (H:MM:SS.cc).
pub fn format_ass_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_cs = (seconds * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs / 6_000) % 60;
    let secs = (total_cs / 100) % 60;
    let centiseconds = total_cs % 100;

    format!("{hours}:{minutes:02}:{secs:02}.{centiseconds:02}")
}

/// Escape special characters in ASS text.
fn escape_ass_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::presets::resolve_theme;
    use crate::subtitles::style::{PlacementStrategy, SubtitleStyle};
    use crate::subtitles::timeline::assemble;
    use crate::subtitles::types::{AudioTrack, Emphasis, SubtitleLayout, SubtitleSegment};

    fn timeline_with(placement: Placement, animation: Animation) -> TimelineResponse {
        let mut segment = SubtitleSegment::new("Buy the big deal", 1.0, 3.0);
        let mut line = SceneSubtitleLine::new("Buy the big deal", 1.0, 3.0);
        line.emphasis = Some(Emphasis {
            phrases: vec!["big deal".to_string()],
            color: None,
        });
        segment.lines = vec![line];
        segment.placement = Some(placement);
        segment.animation = Some(animation);

        assemble(
            vec![segment],
            SubtitleLayout {
                placement_strategy: PlacementStrategy::Dynamic,
                ..SubtitleLayout::default()
            },
            AudioTrack::default(),
            SubtitleStyle::default(),
            None,
            Some(resolve_theme(Some("CLASSIC"))),
            None,
        )
    }

    #[test]
    fn test_format_ass_timestamp() {
        assert_eq!(format_ass_timestamp(0.0), "0:00:00.00");
        assert_eq!(format_ass_timestamp(1.5), "0:00:01.50");
        assert_eq!(format_ass_timestamp(61.0), "0:01:01.00");
        assert_eq!(format_ass_timestamp(3661.0), "1:01:01.00");
        assert_eq!(format_ass_timestamp(0.125), "0:00:00.13");
        // carries into the next second instead of printing .100
        assert_eq!(format_ass_timestamp(59.996), "0:01:00.00");
        assert_eq!(format_ass_timestamp(-2.0), "0:00:00.00");
    }

    #[test]
    fn test_escape_ass_text() {
        assert_eq!(escape_ass_text("Hello world"), "Hello world");
        assert_eq!(escape_ass_text("Line1\nLine2"), "Line1\\NLine2");
        assert_eq!(escape_ass_text("{override}"), "\\{override\\}");
    }

    #[test]
    fn placements_map_to_numpad_alignment() {
        assert_eq!(alignment_for(Placement::Top), 8);
        assert_eq!(alignment_for(Placement::Center), 5);
        assert_eq!(alignment_for(Placement::Bottom), 2);
    }

    #[test]
    fn font_size_scales_with_resolution() {
        assert_eq!(font_size_for(SubtitleSize::M, (1080, 1920)), 52);
        assert_eq!(font_size_for(SubtitleSize::Xl, (1080, 1920)), 80);
        assert_eq!(font_size_for(SubtitleSize::M, (3840, 2160)), 104);
    }

    #[test]
    fn styles_use_safe_area_margins() {
        let timeline = timeline_with(Placement::Bottom, Animation::FadeIn);
        let output = generate_ass(&timeline, &AssOptions::default()).unwrap();

        // bottom 0.14 * 1920 = 269, sides 0.06 * 1080 = 65
        assert!(output.contains("Style: Bottom,Inter,52,&H00FFFFFF,&H00FFFFFF,&H00000000,"));
        assert!(output.contains(",2,65,65,269,1"));
        // top 0.12 * 1920 = 230
        assert!(output.contains(",8,65,65,230,1"));
        assert!(output.contains(",5,65,65,0,1"));
    }

    #[test]
    fn emphasis_uses_theme_accent() {
        let timeline = timeline_with(Placement::Center, Animation::FadeIn);
        let output = generate_ass(&timeline, &AssOptions::default()).unwrap();

        // CLASSIC accent #ffd400 -> &H0000D4FF
        assert!(output.contains(
            "Dialogue: 0,0:00:01.00,0:00:03.00,Center,,0,0,0,,{\\fs52\\fad(150,0)}Buy the {\\1c&H0000D4FF&}big deal{\\1c&H00FFFFFF&}"
        ));
    }

    #[test]
    fn pop_and_slide_animations() {
        let pop = generate_ass(&timeline_with(Placement::Center, Animation::Pop), &AssOptions::default())
            .unwrap();
        assert!(pop.contains("\\fscx80\\fscy80\\t(0,120,\\fscx100\\fscy100)"));

        let slide = generate_ass(&timeline_with(Placement::Bottom, Animation::SlideUp), &AssOptions::default())
            .unwrap();
        // anchor: x = 65 + (1080 - 130) / 2 = 540, y = 1920 - 269 = 1651
        assert!(slide.contains("\\move(540,1691,540,1651,0,180)"));
    }

    #[test]
    fn typewriter_spreads_karaoke_tags() {
        let output = generate_ass(&timeline_with(Placement::Bottom, Animation::Typewriter), &AssOptions::default())
            .unwrap();
        // 2 seconds over 4 words
        assert!(output.contains("{\\k50}Buy {\\k50}the {\\k50}big {\\k50}deal"));
    }

    #[test]
    fn render_hints_shift_and_extend() {
        let line = SceneSubtitleLine::new("x", 1.0, 2.0);
        let hints = RenderHints {
            extend_end_seconds: Some(0.5),
            timing_offset_seconds: Some(-0.25),
        };
        assert_eq!(hinted_interval(&line, true, Some(&hints)), (0.75, 2.25));
        assert_eq!(hinted_interval(&line, false, Some(&hints)), (0.75, 1.75));
        assert_eq!(hinted_interval(&line, true, None), (1.0, 2.0));

        let early = SceneSubtitleLine::new("x", 0.1, 0.2);
        let (start, end) = hinted_interval(&early, false, Some(&hints));
        assert_eq!(start, 0.0);
        assert!(end >= start);
    }
}
