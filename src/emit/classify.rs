//! Block/inline classification over the closed canonical kind set.
//!
//! The emitter dispatches on these decisions only; it never inspects source
//! tag names (those were resolved away by the canonicalizer).

use crate::tree::{BlockKind, Node};

/// Where a node sits in the target grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Block,
    Inline,
}

/// Classify a canonical node. Text and inline nodes join the current inline
/// run; everything else opens a block.
pub fn placement(node: &Node) -> Placement {
    match node {
        Node::Document(_) | Node::Block { .. } => Placement::Block,
        Node::Inline { .. } | Node::Text(_) => Placement::Inline,
    }
}

/// Whether a block of this kind, following another block inside the same
/// list item, must be attached with a continuation marker to keep the item
/// logically intact. In AsciiDoc every block kind detaches without one, so
/// the table is uniform — kept explicit so the policy is auditable per kind.
pub fn continuation_required(kind: BlockKind) -> bool {
    match kind {
        BlockKind::Paragraph
        | BlockKind::List
        | BlockKind::ListItem
        | BlockKind::Admonition
        | BlockKind::Collapsible
        | BlockKind::Table
        | BlockKind::TableRow
        | BlockKind::TableCell
        | BlockKind::MediaBlock
        | BlockKind::Heading
        | BlockKind::CodeBlock
        | BlockKind::Quote
        | BlockKind::ThematicBreak => true,
    }
}
