//! Blank-line and trailing-whitespace normalization.

use super::FenceTracker;

/// Collapse runs of blank lines outside fenced blocks to a single blank
/// line, stripping trailing whitespace from prose lines as it goes.
pub(super) fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut fences = FenceTracker::default();
    let mut blank_run = 0usize;

    for line in text.lines() {
        if fences.observe(line) {
            blank_run = 0;
            out.push(line.to_string());
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line.to_string());
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn fenced_blocks_keep_their_blank_lines() {
        let text = "----\ncode\n\n\n\nmore\n----";
        assert_eq!(collapse_blank_lines(text), text);
    }

    #[test]
    fn trailing_spaces_stripped_outside_fences_only() {
        assert_eq!(collapse_blank_lines("a  \n----\nb  \n----"), "a\n----\nb  \n----");
    }
}
