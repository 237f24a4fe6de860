//! Spacing around inline emphasis markers.
//!
//! String concatenation in the emitter can leave spaces just inside emphasis
//! markers, or markers butted directly against adjacent words. Both are fixed
//! here: `* bold *` becomes `*bold*`, and `word*bold*` becomes `word *bold*`.
//! Backtick spans and fenced blocks are never touched; a leading list-item
//! marker (`* `, `** `, ...) is stepped over before pairing, and a marker
//! pair embedded in a word on both sides (`snake_case_name`) is left alone —
//! that is an identifier, not emphasis.

use super::FenceTracker;
use super::list_punctuation::item_marker;

pub(super) fn normalize_emphasis_spacing(text: &str) -> String {
    let mut fences = FenceTracker::default();
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        if fences.observe(line) {
            out.push(line.to_string());
        } else if let Some(marker) = item_marker(line) {
            // The list marker is not an emphasis delimiter; fix only the
            // item text behind it.
            let rest = &line[marker.len()..];
            out.push(format!("{marker}{}", fix_line(rest)));
        } else {
            out.push(fix_line(line));
        }
    }
    out.join("\n")
}

fn fix_line(line: &str) -> String {
    // Mask inline code: even-indexed split segments are outside backticks.
    line.split('`')
        .enumerate()
        .map(|(idx, seg)| {
            if idx % 2 == 0 {
                let seg = fix_marker(seg, '*');
                fix_marker(&seg, '_')
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("`")
}

fn fix_marker(seg: &str, marker: char) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter_map(|(i, c)| (*c == marker).then_some(i))
        .collect();
    if positions.len() < 2 {
        return seg.to_string();
    }

    let mut out = String::with_capacity(seg.len() + 4);
    let mut consumed = 0usize;
    let mut p = 0usize;
    while p + 1 < positions.len() {
        let (i, j) = (positions[p], positions[p + 1]);
        let content: String = chars[i + 1..j].iter().collect();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            // Doubled or empty markers carry no emphasis; leave them.
            p += 2;
            continue;
        }

        out.extend(chars[consumed..i].iter());
        let abut_before = i > 0 && chars[i - 1].is_alphanumeric();
        let abut_after = j + 1 < chars.len() && chars[j + 1].is_alphanumeric();
        if abut_before && abut_after {
            // Word-internal pair: an identifier, not emphasis.
            out.extend(chars[i..=j].iter());
        } else {
            if abut_before {
                out.push(' ');
            }
            out.push(marker);
            out.push_str(trimmed);
            out.push(marker);
            if abut_after {
                out.push(' ');
            }
        }
        consumed = j + 1;
        p += 2;
    }
    out.extend(chars[consumed..].iter());
    out
}
