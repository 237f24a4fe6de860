//! Text-level post-lint of emitted AsciiDoc.
//!
//! A narrow, idempotent pass over the emitter's output only — it never sees
//! the tree. Each concern lives in its own module and is fence-aware:
//! listing (`----`) and literal (`....`) blocks pass through untouched.

mod blank_lines;
mod emphasis_spacing;
mod list_punctuation;


/// Normalize the emitted text. Idempotent: `lint(lint(x)) == lint(x)`.
pub fn lint(text: &str) -> String {
    let text = blank_lines::collapse_blank_lines(text);
    let text = emphasis_spacing::normalize_emphasis_spacing(&text);
    let text = list_punctuation::normalize_item_punctuation(&text);

    // Canonical document edges: no leading blank, one trailing newline.
    let trimmed = text.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// A listing or literal block delimiter line.
pub(crate) fn is_fence_delimiter(line: &str) -> bool {
    let t = line.trim_end();
    t.len() >= 4 && (t.bytes().all(|b| b == b'-') || t.bytes().all(|b| b == b'.'))
}

/// Tracks whether the cursor is inside a fenced region while streaming lines.
#[derive(Default)]
pub(crate) struct FenceTracker {
    open: Option<String>,
}

impl FenceTracker {
    /// Feed one line; returns true when the line is *inside* a fence (the
    /// delimiters themselves count as inside — they must not be rewritten).
    pub(crate) fn observe(&mut self, line: &str) -> bool {
        if is_fence_delimiter(line) {
            let delim = line.trim_end().to_string();
            match &self.open {
                Some(open) if *open == delim => self.open = None,
                Some(_) => {}
                None => self.open = Some(delim),
            }
            return true;
        }
        self.open.is_some()
    }
}
