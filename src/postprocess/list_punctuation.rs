//! Terminal punctuation consistency inside list items.
//!
//! Within one list, authors often mix items that end with a period and items
//! that just stop. When at least one sibling ends with sentence punctuation,
//! items ending in a word character get a period appended. Lines carrying a
//! trailing `+` line-break continuation are left alone, as are fenced blocks.

use super::FenceTracker;

pub(super) fn normalize_item_punctuation(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut fences = FenceTracker::default();
    // Indices of marker lines in the current list region, keyed by marker.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for line in text.lines() {
        let in_fence = fences.observe(line);
        let idx = lines.len();
        lines.push(line.to_string());
        if in_fence {
            continue;
        }
        if line.trim().is_empty() {
            // A blank line ends the list region.
            apply_groups(&mut lines, &mut groups);
            continue;
        }
        if let Some(marker) = item_marker(line) {
            match groups.iter_mut().find(|(m, _)| *m == marker) {
                Some((_, indices)) => indices.push(idx),
                None => groups.push((marker, vec![idx])),
            }
        }
    }
    apply_groups(&mut lines, &mut groups);
    lines.join("\n")
}

fn apply_groups(lines: &mut [String], groups: &mut Vec<(String, Vec<usize>)>) {
    for (_, indices) in groups.drain(..) {
        let any_punctuated = indices
            .iter()
            .any(|&i| ends_with_sentence_punctuation(&lines[i]));
        if !any_punctuated {
            continue;
        }
        for &i in &indices {
            let line = &lines[i];
            if line.trim_end().ends_with('+') {
                continue;
            }
            if line.chars().last().is_some_and(char::is_alphanumeric) {
                lines[i].push('.');
            }
        }
    }
}

/// The marker prefix of a list-item line (`.`, `..`, `*`, `**`, ...), when
/// the line is one. Shared with the emphasis pass, which must never read a
/// list marker as an emphasis delimiter.
pub(super) fn item_marker(line: &str) -> Option<String> {
    let first = line.chars().next()?;
    if first != '.' && first != '*' {
        return None;
    }
    let marker: String = line.chars().take_while(|&c| c == first).collect();
    let rest = &line[marker.len()..];
    rest.starts_with(' ').then_some(marker)
}

fn ends_with_sentence_punctuation(line: &str) -> bool {
    matches!(
        line.trim_end().chars().last(),
        Some('.' | '!' | '?' | ':' | ';')
    )
}
