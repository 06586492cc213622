//! Case-insensitive emphasis phrase matching.

use std::ops::Range;

use super::types::Emphasis;

/// Byte range of the first case-insensitive occurrence of `needle`.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.trim().chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    'starts: for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        for (offset, ch) in haystack[start..].char_indices() {
            for lower in ch.to_lowercase() {
                if matched < needle.len() && lower == needle[matched] {
                    matched += 1;
                } else {
                    continue 'starts;
                }
            }
            if matched == needle.len() {
                return Some(start..start + offset + ch.len_utf8());
            }
        }
        // ran out of haystack
        return None;
    }
    None
}

/// Phrases from `phrases` that occur in `text`, as they are spelled in
/// `text`, in request order and without duplicates.
pub fn matched_phrases(text: &str, phrases: &[String]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for phrase in phrases {
        let Some(range) = find_ignore_case(text, phrase) else {
            continue;
        };
        let found = text[range].to_string();
        let key = found.to_lowercase();
        if !matched.iter().any(|m| m.to_lowercase() == key) {
            matched.push(found);
        }
    }
    matched
}

/// Emphasis block for `text`, or `None` when nothing matched. The color is
/// left for the assembler to fill from the theme.
pub fn emphasis_for(text: &str, phrases: &[String]) -> Option<Emphasis> {
    let phrases = matched_phrases(text, phrases);
    if phrases.is_empty() {
        return None;
    }
    Some(Emphasis {
        phrases,
        color: None,
    })
}

/// Share of `text`'s characters covered by any occurrence of the phrases.
pub fn coverage(text: &str, phrases: &[String]) -> f64 {
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return 0.0;
    }

    let mut covered = vec![false; text.len()];
    for phrase in phrases {
        let mut offset = 0;
        while offset < text.len() {
            let Some(range) = find_ignore_case(&text[offset..], phrase) else {
                break;
            };
            let absolute = offset + range.start..offset + range.end;
            covered[absolute.clone()].iter_mut().for_each(|flag| *flag = true);
            offset = absolute.end;
        }
    }

    let hits = text
        .char_indices()
        .filter(|(idx, ch)| !ch.is_whitespace() && covered[*idx])
        .count();
    (hits as f64 / total as f64).min(1.0)
}
