//! Structural repair of canonical trees.
//!
//! Authoring tools routinely emit lists with stray block children and
//! semantically nested lists as siblings. The repair rules here restore the
//! canonical invariants:
//!
//! - a list's direct children are exclusively list items;
//! - a list that immediately follows another list (nothing intervening — an
//!   intervening heading or paragraph means "separate list") is re-parented
//!   as the last child of the preceding list's final item. Every such
//!   re-parenting is a heuristic call and is recorded as an
//!   [`WarningCode::AmbiguousListNesting`] warning so it can be audited.
//!
//! A single pass is not enough for interleaved anomalies, so the rules run
//! in an explicit fixpoint loop with an iteration cap.

use log::{debug, warn};

use crate::error::{Warning, WarningCode};
use crate::tree::{BlockKind, Node};

/// Iteration cap for the repair fixpoint loop.
const MAX_REPAIR_PASSES: usize = 8;

/// Repair a canonical tree in place. Idempotent: repairing an already
/// repaired tree changes nothing.
pub fn repair_tree(root: &mut Node) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for pass in 0..MAX_REPAIR_PASSES {
        let mut changed = false;
        repair_node(root, &mut changed, &mut warnings);
        if !changed {
            debug!("structural repair stable after {} pass(es)", pass + 1);
            return warnings;
        }
    }
    warn!("structural repair did not stabilize within {MAX_REPAIR_PASSES} passes");
    warnings
}

fn repair_node(node: &mut Node, changed: &mut bool, warnings: &mut Vec<Warning>) {
    match node {
        Node::Document(children) | Node::Block { children, .. } | Node::Inline { children, .. } => {
            repair_children(children, changed, warnings);
            for child in children.iter_mut() {
                repair_node(child, changed, warnings);
            }
        }
        Node::Text(_) => {}
    }
}

fn repair_children(children: &mut Vec<Node>, changed: &mut bool, warnings: &mut Vec<Warning>) {
    // Absorb or hoist non-item children of lists.
    let mut i = 0;
    while i < children.len() {
        if children[i].is_block(BlockKind::List) {
            let hoisted = clean_list(&mut children[i], changed);
            if !hoisted.is_empty() {
                *changed = true;
                for (offset, node) in hoisted.into_iter().enumerate() {
                    children.insert(i + offset, node);
                    i += 1;
                }
            }
            if children[i].children().is_empty() {
                // Nothing left once strays moved out.
                children.remove(i);
                *changed = true;
                continue;
            }
        }
        i += 1;
    }

    // Re-parent adjacent sibling lists under the preceding item.
    let mut i = 0;
    while i + 1 < children.len() {
        if children[i].is_block(BlockKind::List)
            && children[i + 1].is_block(BlockKind::List)
            && merge_sibling_list(children, i, warnings)
        {
            *changed = true;
            continue;
        }
        i += 1;
    }
}

/// Move stray children of a list either into the nearest preceding item or,
/// when no item precedes them, out above the list (returned for the caller to
/// splice in front). Never drops content.
fn clean_list(list: &mut Node, changed: &mut bool) -> Vec<Node> {
    let Node::Block { children: items, .. } = list else {
        return Vec::new();
    };
    if items.iter().all(|c| c.is_block(BlockKind::ListItem)) {
        return Vec::new();
    }

    let mut hoisted = Vec::new();
    let mut cleaned: Vec<Node> = Vec::new();
    for node in items.drain(..) {
        if node.is_block(BlockKind::ListItem) {
            cleaned.push(node);
            continue;
        }
        *changed = true;
        if !node.is_block_level() && node.is_whitespace_only() {
            continue;
        }
        let block = if node.is_block_level() {
            node
        } else {
            Node::paragraph(vec![node])
        };
        match cleaned.iter_mut().rev().find(|c| c.is_block(BlockKind::ListItem)) {
            Some(Node::Block { children: item_children, .. }) => item_children.push(block),
            _ => hoisted.push(block),
        }
    }
    *items = cleaned;
    hoisted
}

/// Tie-break rule: a sibling list directly following a list is treated as a
/// nested sub-list of the preceding item. Separation (an intervening heading
/// or paragraph) means the lists are never adjacent here in the first place.
fn merge_sibling_list(children: &mut Vec<Node>, i: usize, warnings: &mut Vec<Warning>) -> bool {
    let has_item = matches!(
        &children[i],
        Node::Block { children: items, .. }
            if items.iter().any(|c| c.is_block(BlockKind::ListItem))
    );
    if !has_item {
        return false;
    }
    let sibling = children.remove(i + 1);
    if let Node::Block { children: items, .. } = &mut children[i]
        && let Some(Node::Block { children: item_children, .. }) = items
            .iter_mut()
            .rev()
            .find(|c| c.is_block(BlockKind::ListItem))
    {
        item_children.push(sibling);
        warnings.push(Warning::new(
            WarningCode::AmbiguousListNesting,
            "adjacent sibling list re-parented under the preceding list item",
        ));
        true
    } else {
        children.insert(i + 1, sibling);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ListStyle;

    fn item(text: &str) -> Node {
        Node::list_item(vec![Node::paragraph(vec![Node::text(text)])])
    }

    #[test]
    fn orphan_paragraph_merges_into_preceding_item() {
        let mut doc = Node::Document(vec![Node::list(
            ListStyle::Numeric,
            vec![
                item("A"),
                item("B"),
                Node::paragraph(vec![Node::text("orphan")]),
            ],
        )]);
        let warnings = repair_tree(&mut doc);
        assert!(warnings.is_empty());

        let Node::Document(blocks) = &doc else { unreachable!() };
        let list = &blocks[0];
        assert_eq!(list.children().len(), 2);
        let item_b = &list.children()[1];
        assert_eq!(item_b.children().len(), 2);
        assert_eq!(item_b.children()[1].plain_text(), "orphan");
    }

    #[test]
    fn orphan_with_no_preceding_item_hoists_above_the_list() {
        let mut doc = Node::Document(vec![Node::list(
            ListStyle::Bullet,
            vec![Node::paragraph(vec![Node::text("lead")]), item("A")],
        )]);
        repair_tree(&mut doc);

        let Node::Document(blocks) = &doc else { unreachable!() };
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_block(BlockKind::Paragraph));
        assert!(blocks[1].is_block(BlockKind::List));
        assert_eq!(blocks[1].children().len(), 1);
    }

    #[test]
    fn adjacent_sibling_list_nests_under_last_item() {
        let mut doc = Node::Document(vec![
            Node::list(ListStyle::Numeric, vec![item("step 1"), item("step 2")]),
            Node::list(ListStyle::LowerAlpha, vec![item("sub a"), item("sub b")]),
        ]);
        let warnings = repair_tree(&mut doc);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::AmbiguousListNesting);

        let Node::Document(blocks) = &doc else { unreachable!() };
        assert_eq!(blocks.len(), 1);
        let step2 = &blocks[0].children()[1];
        // Original paragraph plus the re-parented sub-list.
        assert_eq!(step2.children().len(), 2);
        assert!(step2.children()[1].is_block(BlockKind::List));
    }

    #[test]
    fn separated_lists_stay_separate() {
        let mut doc = Node::Document(vec![
            Node::list(ListStyle::Numeric, vec![item("one")]),
            Node::paragraph(vec![Node::text("between")]),
            Node::list(ListStyle::Numeric, vec![item("two")]),
        ]);
        let warnings = repair_tree(&mut doc);
        assert!(warnings.is_empty());
        let Node::Document(blocks) = &doc else { unreachable!() };
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn repair_is_idempotent() {
        let mut doc = Node::Document(vec![
            Node::list(
                ListStyle::Numeric,
                vec![
                    item("A"),
                    Node::paragraph(vec![Node::text("stray")]),
                    item("B"),
                ],
            ),
            Node::list(ListStyle::Bullet, vec![item("sub")]),
        ]);
        repair_tree(&mut doc);
        let first = doc.clone();
        let warnings = repair_tree(&mut doc);
        assert!(warnings.is_empty());
        assert_eq!(doc, first);
    }

    #[test]
    fn lists_left_empty_by_hoisting_disappear() {
        let mut doc = Node::Document(vec![Node::list(
            ListStyle::Bullet,
            vec![Node::paragraph(vec![Node::text("only stray")])],
        )]);
        repair_tree(&mut doc);
        let Node::Document(blocks) = &doc else { unreachable!() };
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_block(BlockKind::Paragraph));
    }
}
