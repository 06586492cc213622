//! Placement director: decides where, how large and with which animation
//! each segment is shown.
//!
//! FIXED mode stamps the same direction on every segment. DYNAMIC mode scans
//! segments in chronological order and moves emphasized beats to the center,
//! subject to the long-sentence and center-run limits and to the minimum
//! spacing between placement changes.

use super::emphasis::{coverage, emphasis_for};
use super::presets::{DirectionProfile, direction_profile, style_preset};
use super::splitter::normalize_text;
use super::style::{
    Animation, DirectionPreset, Placement, PlacementStrategy, SubtitleSize, SubtitleStyle,
};
use super::types::{DynamicRules, LayoutConstraints, SubtitleSegment};

/// Creativity used when neither the request nor the preset sets one.
pub const DEFAULT_CREATIVITY: f64 = 0.5;

/// Emphasis bias at or above which a segment goes to the center.
const CENTER_BIAS_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionRequest {
    pub style: SubtitleStyle,
    pub preset: Option<DirectionPreset>,
    pub placement_strategy: PlacementStrategy,
    pub default_placement: Placement,
    pub emphasis_phrases: Vec<String>,
    /// Total timeline duration. Zero when unknown.
    pub duration_sec: f64,
    /// Explicit creativity. Takes precedence over the preset.
    pub creativity: Option<f64>,
    /// Used when neither `creativity` nor the preset provides a value.
    pub fallback_creativity: f64,
    pub constraints: LayoutConstraints,
    pub dynamic_rules: DynamicRules,
}

impl Default for DirectionRequest {
    fn default() -> Self {
        Self {
            style: SubtitleStyle::default(),
            preset: None,
            placement_strategy: PlacementStrategy::default(),
            default_placement: Placement::default(),
            emphasis_phrases: Vec::new(),
            duration_sec: 0.0,
            creativity: None,
            fallback_creativity: DEFAULT_CREATIVITY,
            constraints: LayoutConstraints::default(),
            dynamic_rules: DynamicRules::default(),
        }
    }
}

impl DirectionRequest {
    fn profile(&self) -> Option<&'static DirectionProfile> {
        self.preset.map(direction_profile)
    }

    /// Request value, then preset value, then fallback; clamped to `[0, 1]`.
    pub fn effective_creativity(&self) -> f64 {
        let value = self
            .creativity
            .filter(|c| c.is_finite())
            .or_else(|| self.profile().map(|profile| profile.creativity))
            .unwrap_or(self.fallback_creativity);
        if value.is_finite() { value.clamp(0.0, 1.0) } else { DEFAULT_CREATIVITY }
    }

    /// Minimum seconds between placement changes, exactly as configured.
    pub fn min_change_gap(&self) -> f64 {
        let gap = self.dynamic_rules.min_seconds_between_placement_changes;
        if gap.is_finite() { gap.max(0.0) } else { 0.0 }
    }

    fn baseline(&self) -> Placement {
        match self.default_placement {
            Placement::Top => Placement::Top,
            Placement::Center | Placement::Bottom => Placement::Bottom,
        }
    }

    fn animation_for(&self, placement: Placement) -> Animation {
        match (self.profile(), self.placement_strategy) {
            (Some(profile), PlacementStrategy::Dynamic) => profile.animation_for(placement),
            (Some(profile), PlacementStrategy::Fixed) => profile.default_animation,
            (None, PlacementStrategy::Dynamic) if placement == Placement::Center => Animation::Pop,
            (None, _) => Animation::FadeIn,
        }
    }

    fn size_for(&self, placement: Placement) -> SubtitleSize {
        match (self.profile(), self.placement_strategy) {
            (Some(profile), PlacementStrategy::Dynamic) => profile.size_for(placement),
            _ => style_preset(self.style).size,
        }
    }
}

/// Rolling state of the dynamic scan.
#[derive(Debug, Default)]
struct DynamicState {
    last: Option<Placement>,
    last_change_at: f64,
    center_run: usize,
}

/// Populate placement, animation, size and emphasis on every segment and its
/// lines. Segments keep their input order; the dynamic scan visits them by
/// start time.
pub fn build_direction(
    mut segments: Vec<SubtitleSegment>,
    request: &DirectionRequest,
) -> Vec<SubtitleSegment> {
    let placements = match request.placement_strategy {
        PlacementStrategy::Fixed => vec![request.default_placement; segments.len()],
        PlacementStrategy::Dynamic => dynamic_placements(&segments, request),
    };

    for (segment, placement) in segments.iter_mut().zip(placements) {
        apply_direction(segment, placement, request);
    }
    segments
}

fn apply_direction(segment: &mut SubtitleSegment, placement: Placement, request: &DirectionRequest) {
    let size = request.size_for(placement);
    segment.placement = Some(placement);
    segment.animation = Some(request.animation_for(placement));
    segment.size = Some(size);
    segment.emphasis = emphasis_for(&segment.text, &request.emphasis_phrases);

    for line in &mut segment.lines {
        line.size = size;
        line.emphasis = emphasis_for(&line.text, &request.emphasis_phrases);
    }
}

fn dynamic_placements(segments: &[SubtitleSegment], request: &DirectionRequest) -> Vec<Placement> {
    let baseline = request.baseline();
    let creativity = request.effective_creativity();
    let min_gap = request.min_change_gap();
    let max_center = request.dynamic_rules.max_center_blocks_in_row;
    let constraints = &request.constraints;
    let long_threshold = constraints.long_sentence_threshold();

    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&a, &b| segments[a].start.total_cmp(&segments[b].start));

    let mut placements = vec![baseline; segments.len()];
    let mut state = DynamicState::default();

    for idx in order {
        let segment = &segments[idx];
        let long_sentence = constraints.avoid_center_long_sentences
            && normalize_text(&segment.text).chars().count() > long_threshold;

        let mut candidate = baseline;
        if constraints.prefer_center_for_emphasis && !long_sentence && creativity > 0.0 {
            let matched = emphasis_for(&segment.text, &request.emphasis_phrases);
            if let Some(emphasis) = matched {
                let bias = creativity * (0.5 + 0.5 * coverage(&segment.text, &emphasis.phrases));
                if bias >= CENTER_BIAS_THRESHOLD {
                    candidate = Placement::Center;
                }
            }
        }

        // Hold the previous placement when a change would come too soon.
        if let Some(previous) = state.last
            && candidate != previous
            && segment.start - state.last_change_at < min_gap
        {
            candidate = previous;
        }

        // Hard limits win over the hold.
        if candidate == Placement::Center
            && (long_sentence || state.center_run + 1 > max_center)
        {
            candidate = baseline;
        }

        if state.last != Some(candidate) {
            state.last_change_at = segment.start;
        }
        state.center_run = if candidate == Placement::Center {
            state.center_run + 1
        } else {
            0
        };
        state.last = Some(candidate);
        placements[idx] = candidate;
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::types::SceneSubtitleLine;

    fn segment(text: &str, start: f64, end: f64) -> SubtitleSegment {
        let mut segment = SubtitleSegment::new(text, start, end);
        segment.lines = vec![SceneSubtitleLine::new(text, start, end)];
        segment
    }

    fn dynamic_request(phrases: &[&str], creativity: f64) -> DirectionRequest {
        DirectionRequest {
            placement_strategy: PlacementStrategy::Dynamic,
            emphasis_phrases: phrases.iter().map(|p| p.to_string()).collect(),
            creativity: Some(creativity),
            ..DirectionRequest::default()
        }
    }

    fn placements(segments: &[SubtitleSegment]) -> Vec<Placement> {
        segments.iter().filter_map(|s| s.placement).collect()
    }

    /// One emphasized segment per second.
    fn emphasized_run(count: usize) -> Vec<SubtitleSegment> {
        (0..count)
            .map(|i| segment("big win", i as f64, i as f64 + 1.0))
            .collect()
    }

    #[test]
    fn fixed_mode_is_idempotent() {
        let segments = vec![segment("Hello there", 0.0, 1.0), segment("big win", 1.0, 2.0)];
        let request = DirectionRequest {
            style: SubtitleStyle::AlexHormozi,
            default_placement: Placement::Top,
            emphasis_phrases: vec!["win".to_string()],
            ..DirectionRequest::default()
        };

        let once = build_direction(segments.clone(), &request);
        let twice = build_direction(once.clone(), &request);
        assert_eq!(once, twice);
        for segment in &once {
            assert_eq!(segment.placement, Some(Placement::Top));
            assert_eq!(segment.animation, Some(Animation::FadeIn));
            assert_eq!(segment.size, Some(SubtitleSize::Xl));
        }
    }

    #[test]
    fn fixed_mode_uses_preset_animation() {
        let request = DirectionRequest {
            preset: Some(DirectionPreset::TrailerV1),
            ..DirectionRequest::default()
        };
        let out = build_direction(vec![segment("x", 0.0, 1.0)], &request);
        assert_eq!(out[0].animation, Some(Animation::SlideUp));
        assert_eq!(out[0].placement, Some(Placement::Bottom));
    }

    #[test]
    fn emphasis_is_recorded_on_segments_and_lines() {
        let mut seg = SubtitleSegment::new("Order now today", 0.0, 2.0);
        seg.lines = vec![
            SceneSubtitleLine::new("Order now", 0.0, 1.0),
            SceneSubtitleLine::new("today", 1.0, 2.0),
        ];
        let request = DirectionRequest {
            emphasis_phrases: vec!["NOW".to_string()],
            ..DirectionRequest::default()
        };
        let out = build_direction(vec![seg], &request);
        let emphasis = out[0].emphasis.as_ref().unwrap();
        assert_eq!(emphasis.phrases, vec!["now".to_string()]);
        assert!(out[0].lines[0].emphasis.is_some());
        assert!(out[0].lines[1].emphasis.is_none());
    }

    #[test]
    fn zero_creativity_never_centers() {
        let out = build_direction(emphasized_run(6), &dynamic_request(&["big win"], 0.0));
        assert!(placements(&out).iter().all(|p| *p == Placement::Bottom));
    }

    #[test]
    fn full_creativity_centers_emphasis() {
        let segments = vec![segment("big win", 0.0, 1.0)];
        let out = build_direction(segments, &dynamic_request(&["win"], 1.0));
        assert_eq!(out[0].placement, Some(Placement::Center));
        assert_eq!(out[0].animation, Some(Animation::Pop));
    }

    #[test]
    fn partial_coverage_needs_more_creativity() {
        // "win" covers 3 of 20 characters: bias = 0.6 * 0.575 < 0.5
        let segments = vec![segment("we will surely win today", 0.0, 1.0)];
        let out = build_direction(segments.clone(), &dynamic_request(&["win"], 0.6));
        assert_eq!(out[0].placement, Some(Placement::Bottom));

        // full coverage: bias = 0.6
        let segments = vec![segment("win", 0.0, 1.0)];
        let out = build_direction(segments, &dynamic_request(&["win"], 0.6));
        assert_eq!(out[0].placement, Some(Placement::Center));
    }

    #[test]
    fn long_sentences_never_go_center() {
        let text = "this win sits inside a sentence that is clearly much longer than sixty characters";
        let out = build_direction(vec![segment(text, 0.0, 4.0)], &dynamic_request(&["win"], 1.0));
        assert_eq!(out[0].placement, Some(Placement::Bottom));

        let mut request = dynamic_request(&["win"], 1.0);
        request.constraints.avoid_center_long_sentences = false;
        let out = build_direction(vec![segment(text, 0.0, 4.0)], &request);
        assert_eq!(out[0].placement, Some(Placement::Center));
    }

    #[test]
    fn center_runs_are_bounded() {
        for max in 0..4 {
            let mut request = dynamic_request(&["big win"], 1.0);
            request.dynamic_rules.max_center_blocks_in_row = max;
            let out = build_direction(emphasized_run(12), &request);

            let mut run = 0;
            for placement in placements(&out) {
                run = if placement == Placement::Center { run + 1 } else { 0 };
                assert!(run <= max, "run {run} exceeds {max}");
            }
        }
    }

    #[test]
    fn placement_changes_respect_min_gap() {
        let request = dynamic_request(&["big win"], 1.0);
        let segments: Vec<SubtitleSegment> = (0..20)
            .map(|i| {
                let text = if i % 2 == 0 { "big win" } else { "plain words here" };
                segment(text, i as f64 * 0.5, i as f64 * 0.5 + 0.5)
            })
            .collect();
        let out = build_direction(segments, &request);

        let mut last_change: Option<f64> = None;
        let mut center_run = 0;
        for pair in out.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            center_run = if prev.placement == Some(Placement::Center) { center_run + 1 } else { 0 };
            if prev.placement == next.placement {
                continue;
            }
            let forced_exit = prev.placement == Some(Placement::Center)
                && center_run >= request.dynamic_rules.max_center_blocks_in_row;
            if let Some(at) = last_change
                && !forced_exit
            {
                assert!(
                    next.start - at >= request.dynamic_rules.min_seconds_between_placement_changes,
                    "change at {} only {}s after {}",
                    next.start,
                    next.start - at,
                    at
                );
            }
            last_change = Some(next.start);
        }
    }

    #[test]
    fn forced_exit_then_hold() {
        let out = build_direction(emphasized_run(5), &dynamic_request(&["big win"], 1.0));
        assert_eq!(
            placements(&out),
            vec![
                Placement::Center,
                Placement::Center,
                Placement::Bottom,
                Placement::Bottom,
                Placement::Center,
            ]
        );
    }

    #[test]
    fn top_default_makes_top_the_baseline() {
        let mut request = dynamic_request(&["win"], 1.0);
        request.default_placement = Placement::Top;
        let segments = vec![segment("plain", 0.0, 1.0), segment("win", 5.0, 6.0)];
        let out = build_direction(segments, &request);
        assert_eq!(placements(&out), vec![Placement::Top, Placement::Center]);
    }

    #[test]
    fn dynamic_scan_follows_start_time() {
        // Out-of-order input: the earlier segment is visited first.
        let segments = vec![segment("big win", 1.0, 2.0), segment("big win", 0.0, 1.0)];
        let mut request = dynamic_request(&["big win"], 1.0);
        request.dynamic_rules.max_center_blocks_in_row = 1;
        let out = build_direction(segments, &request);
        assert_eq!(out[1].placement, Some(Placement::Center));
        assert_eq!(out[0].placement, Some(Placement::Bottom));
    }

    #[test]
    fn preset_drives_dynamic_sizes() {
        let mut request = dynamic_request(&["win"], 1.0);
        request.preset = Some(DirectionPreset::CinematicDynamicV1);
        let segments = vec![segment("win", 0.0, 1.0), segment("calm", 5.0, 6.0)];
        let out = build_direction(segments, &request);
        assert_eq!(out[0].size, Some(SubtitleSize::Xl));
        assert_eq!(out[0].lines[0].size, SubtitleSize::Xl);
        assert_eq!(out[1].size, Some(SubtitleSize::L));
    }

    #[test]
    fn creativity_falls_back_through_preset() {
        let mut request = DirectionRequest {
            preset: Some(DirectionPreset::Documentary),
            ..DirectionRequest::default()
        };
        assert_eq!(request.effective_creativity(), 0.2);
        request.creativity = Some(3.0);
        assert_eq!(request.effective_creativity(), 1.0);
        request.preset = None;
        request.creativity = None;
        request.fallback_creativity = 0.4;
        assert_eq!(request.effective_creativity(), 0.4);
    }

    #[test]
    fn min_gap_ignores_timeline_length() {
        let mut request = DirectionRequest::default();
        assert_eq!(request.min_change_gap(), 2.0);
        request.duration_sec = 4.0;
        assert_eq!(request.min_change_gap(), 2.0);
        request.dynamic_rules.min_seconds_between_placement_changes = -1.0;
        assert_eq!(request.min_change_gap(), 0.0);
    }
}
