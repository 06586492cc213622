//! Overflow resolution: bring a segment back within its line budget.

use std::ops::Range;

use super::splitter::LineSource;
use super::style::OverflowStrategy;
use super::types::SceneSubtitleLine;

/// Upper bound on re-pack attempts. The last attempt widens to the whole text,
/// which always fits in one line.
pub const MAX_REBALANCE_ITERATIONS: usize = 5;

/// Reduce `lines` to at most `max_lines` lines.
///
/// `lines` must have been produced from `source`; the resolver re-packs or
/// merges the underlying words so text and timing stay consistent. Never
/// fails: the result always joins back to the source text.
pub fn resolve_overflow(
    source: &LineSource,
    lines: Vec<SceneSubtitleLine>,
    max_chars: usize,
    max_lines: usize,
    strategy: OverflowStrategy,
) -> Vec<SceneSubtitleLine> {
    let max_lines = max_lines.max(1);
    if lines.len() <= max_lines {
        return lines;
    }

    let groups = source.groups_for(&lines);
    let groups = match strategy {
        OverflowStrategy::Rebalance => rebalance(source, groups, max_chars, max_lines),
        OverflowStrategy::Shrink => shrink(source, groups, max_lines),
        OverflowStrategy::RebalanceThenShrink => {
            let rebalanced = rebalance(source, groups, max_chars, max_lines);
            if rebalanced.len() > max_lines {
                shrink(source, rebalanced, max_lines)
            } else {
                rebalanced
            }
        }
    };
    source.build_lines(&groups)
}

/// Re-pack with a proportionally wider line until the budget is met.
fn rebalance(
    source: &LineSource,
    groups: Vec<Range<usize>>,
    max_chars: usize,
    max_lines: usize,
) -> Vec<Range<usize>> {
    let full_width = source.text_len().max(1);
    let mut width = max_chars.max(1);
    let mut best = groups;

    for iteration in 1..=MAX_REBALANCE_ITERATIONS {
        if best.len() <= max_lines {
            break;
        }
        width = if iteration == MAX_REBALANCE_ITERATIONS {
            full_width
        } else {
            (width * best.len())
                .div_ceil(max_lines)
                .max(width + 1)
                .min(full_width)
        };
        best = source.pack_groups(width);
    }
    best
}

/// Merge the smallest adjacent pair until the budget is met.
fn shrink(source: &LineSource, mut groups: Vec<Range<usize>>, max_lines: usize) -> Vec<Range<usize>> {
    while groups.len() > max_lines && groups.len() > 1 {
        let idx = (0..groups.len() - 1)
            .min_by_key(|&i| source.group_chars(&groups[i]) + source.group_chars(&groups[i + 1]))
            .unwrap_or(0);
        let merged = groups[idx].start..groups[idx + 1].end;
        groups[idx] = merged;
        groups.remove(idx + 1);
    }
    groups
}
