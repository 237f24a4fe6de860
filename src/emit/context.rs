//! Explicit emission context.
//!
//! List depth, active list styles and admonition nesting are threaded through
//! the recursion as a context value owned by the emitter — never as
//! module-level state — so concurrent conversions share nothing.

use crate::tree::{AdmonitionKind, ListStyle};

/// One currently open list. Invariant: `depth` equals the stack position
/// (1-based); `style` is fixed for the lifetime of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFrame {
    pub style: ListStyle,
    pub depth: usize,
    pub item_index: usize,
}

/// One currently open admonition or collapsible region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmonitionFrame {
    pub kind: Option<AdmonitionKind>,
    pub title: Option<String>,
}

#[derive(Debug, Default)]
pub struct EmitContext {
    lists: Vec<ListFrame>,
    admonitions: Vec<AdmonitionFrame>,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a list frame and return its depth.
    pub fn push_list(&mut self, style: ListStyle) -> usize {
        let depth = self.lists.len() + 1;
        self.lists.push(ListFrame {
            style,
            depth,
            item_index: 0,
        });
        depth
    }

    pub fn pop_list(&mut self) {
        self.lists.pop();
    }

    pub fn list_depth(&self) -> usize {
        self.lists.len()
    }

    /// Style of the innermost open list, read from the frame rather than
    /// recomputed from source attributes.
    pub fn current_style(&self) -> Option<ListStyle> {
        self.lists.last().map(|f| f.style)
    }

    /// Advance to the next item of the innermost list and return its 1-based
    /// index.
    pub fn next_item(&mut self) -> usize {
        match self.lists.last_mut() {
            Some(frame) => {
                frame.item_index += 1;
                frame.item_index
            }
            None => 0,
        }
    }

    pub fn push_admonition(&mut self, kind: Option<AdmonitionKind>, title: Option<String>) {
        self.admonitions.push(AdmonitionFrame { kind, title });
    }

    pub fn pop_admonition(&mut self) {
        self.admonitions.pop();
    }

    pub fn admonition_depth(&self) -> usize {
        self.admonitions.len()
    }
}
