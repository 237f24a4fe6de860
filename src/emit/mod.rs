//! Recursive AsciiDoc emission from the canonical tree.
//!
//! One depth-first walk. Block nodes flush the current inline run and render
//! through the context (list frames, admonition frames); inline nodes append
//! to the run. The continuation rule lives here: inside a list item, every
//! block child after the first is attached with a `+` line, otherwise the
//! target grammar silently detaches it and sub-lists renumber from 1.

mod classify;
mod context;

pub use classify::{Placement, continuation_required, placement};
pub use context::{AdmonitionFrame, EmitContext, ListFrame};

use log::warn;

use crate::error::{Warning, WarningCode};
use crate::options::{ConversionOptions, VariableMode};
use crate::resolve::{VariableResolver, XrefTable};
use crate::tree::{AdmonitionKind, BlockAttrs, BlockKind, InlineKind, ListStyle, Node};

/// Render a canonical tree to AsciiDoc text.
pub(crate) fn emit(
    tree: &Node,
    xrefs: &XrefTable,
    variables: &dyn VariableResolver,
    options: &ConversionOptions,
) -> (String, Vec<Warning>) {
    let mut emitter = Emitter {
        options,
        xrefs,
        variables,
        warnings: Vec::new(),
    };
    let mut ctx = EmitContext::new();
    let text = match tree {
        Node::Document(children) => emitter.emit_blocks(children, &mut ctx),
        other => emitter.emit_blocks(std::slice::from_ref(other), &mut ctx),
    };
    (text, emitter.warnings)
}

struct Emitter<'a> {
    options: &'a ConversionOptions,
    xrefs: &'a XrefTable,
    variables: &'a dyn VariableResolver,
    warnings: Vec<Warning>,
}

impl Emitter<'_> {
    /// Emit a sequence of children in block context. Any stray inline run is
    /// flushed as a paragraph at the next block boundary.
    fn emit_blocks(&mut self, children: &[Node], ctx: &mut EmitContext) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut run: Vec<&Node> = Vec::new();
        for child in children {
            match placement(child) {
                Placement::Inline => run.push(child),
                Placement::Block => {
                    self.flush_run(&mut run, &mut parts, ctx);
                    let rendered = self.emit_block(child, ctx);
                    if !rendered.is_empty() {
                        parts.push(rendered);
                    }
                }
            }
        }
        self.flush_run(&mut run, &mut parts, ctx);
        parts.join("\n\n")
    }

    fn flush_run(&mut self, run: &mut Vec<&Node>, parts: &mut Vec<String>, ctx: &mut EmitContext) {
        if run.is_empty() {
            return;
        }
        let text = self.emit_inline_nodes(run, ctx);
        run.clear();
        let text = defuse_block_syntax(text.trim());
        if !text.is_empty() {
            parts.push(text);
        }
    }

    fn emit_block(&mut self, node: &Node, ctx: &mut EmitContext) -> String {
        let Node::Block {
            kind,
            attrs,
            children,
        } = node
        else {
            // Unreachable for canonical trees; degrade like any unknown node.
            return self.emit_inline_nodes(&node.children().iter().collect::<Vec<_>>(), ctx);
        };
        match kind {
            BlockKind::Paragraph => {
                let text = self.emit_inline_run(children, ctx);
                defuse_block_syntax(&text)
            }
            BlockKind::Heading => {
                let text = self.emit_inline_run(children, ctx);
                let level = attrs.level.clamp(1, 6) as usize;
                format!("{} {}", "=".repeat(level), text)
            }
            BlockKind::List => self.emit_list(attrs, children, ctx),
            BlockKind::ListItem => {
                // A bare item outside a list frame; render its body.
                self.emit_blocks(children, ctx)
            }
            BlockKind::Admonition => self.emit_admonition(attrs, children, ctx),
            BlockKind::Collapsible => self.emit_collapsible(attrs, children, ctx),
            BlockKind::CodeBlock => emit_code_block(attrs, children),
            BlockKind::Quote => {
                let body = self.emit_blocks(children, ctx);
                format!("____\n{body}\n____")
            }
            BlockKind::Table => self.emit_table(attrs, children, ctx),
            BlockKind::TableRow | BlockKind::TableCell => {
                // Only meaningful under a table; fall back to the body.
                self.emit_blocks(children, ctx)
            }
            BlockKind::MediaBlock => {
                let src = attrs.src.as_deref().unwrap_or_default();
                let alt = attrs.alt.as_deref().unwrap_or_default();
                format!("image::{src}[{alt}]")
            }
            BlockKind::ThematicBreak => "'''".to_string(),
        }
    }

    fn emit_list(&mut self, attrs: &BlockAttrs, items: &[Node], ctx: &mut EmitContext) -> String {
        let style = attrs.list_style.unwrap_or(ListStyle::Bullet);
        let depth = ctx.push_list(style);
        let mut lines: Vec<String> = Vec::new();
        match style {
            ListStyle::LowerAlpha => lines.push("[loweralpha]".to_string()),
            ListStyle::UpperAlpha => lines.push("[upperalpha]".to_string()),
            _ => {}
        }
        let marker = match style {
            ListStyle::Bullet => "*".repeat(depth),
            _ => ".".repeat(depth),
        };
        for item in items {
            ctx.next_item();
            lines.push(self.emit_list_item(&marker, item.children(), ctx));
        }
        ctx.pop_list();
        lines.join("\n")
    }

    /// One item: a primary marker line, then each further block child behind
    /// a `+` continuation line (N block children produce N-1 continuations).
    fn emit_list_item(&mut self, marker: &str, blocks: &[Node], ctx: &mut EmitContext) -> String {
        let mut out = String::new();
        let mut first = true;
        for block in blocks {
            if first {
                first = false;
                let primary = match block {
                    Node::Block {
                        kind: BlockKind::Paragraph,
                        children,
                        ..
                    } => self.emit_inline_run(children, ctx),
                    other => {
                        // Item opening straight with a non-paragraph block
                        // (e.g. a nested list): anchor it to an empty primary
                        // line and attach the block.
                        let rendered = self.emit_block(other, ctx);
                        out.push_str(marker);
                        out.push_str(" {empty}\n+\n");
                        out.push_str(&rendered);
                        continue;
                    }
                };
                out.push_str(marker);
                out.push(' ');
                out.push_str(&primary);
                continue;
            }
            let rendered = self.emit_block(block, ctx);
            if rendered.is_empty() {
                continue;
            }
            debug_assert!(matches!(block, Node::Block { kind, .. } if continuation_required(*kind)));
            out.push_str("\n+\n");
            out.push_str(&rendered);
        }
        if first {
            // Empty item still gets its marker: K items means K markers.
            out.push_str(marker);
            out.push(' ');
        }
        out
    }

    fn emit_admonition(
        &mut self,
        attrs: &BlockAttrs,
        children: &[Node],
        ctx: &mut EmitContext,
    ) -> String {
        let kind = attrs.admonition.unwrap_or(AdmonitionKind::Note);
        let fence = "=".repeat(4 + ctx.admonition_depth());
        ctx.push_admonition(Some(kind), attrs.title.clone());
        let single_paragraph =
            children.len() == 1 && children[0].is_block(BlockKind::Paragraph);
        let result = if attrs.title.is_none() && single_paragraph {
            let text = self.emit_block(&children[0], ctx);
            format!("{}: {text}", kind.keyword())
        } else {
            let body = self.emit_blocks(children, ctx);
            let mut out = String::new();
            if let Some(title) = &attrs.title {
                out.push_str(&format!(".{title}\n"));
            }
            out.push_str(&format!("[{}]\n{fence}\n{body}\n{fence}", kind.keyword()));
            out
        };
        ctx.pop_admonition();
        result
    }

    fn emit_collapsible(
        &mut self,
        attrs: &BlockAttrs,
        children: &[Node],
        ctx: &mut EmitContext,
    ) -> String {
        let fence = "=".repeat(4 + ctx.admonition_depth());
        ctx.push_admonition(None, attrs.title.clone());
        let body = self.emit_blocks(children, ctx);
        ctx.pop_admonition();
        let mut out = String::new();
        if let Some(title) = &attrs.title {
            out.push_str(&format!(".{title}\n"));
        }
        out.push_str(&format!("[%collapsible]\n{fence}\n{body}\n{fence}"));
        out
    }

    fn emit_table(&mut self, attrs: &BlockAttrs, rows: &[Node], ctx: &mut EmitContext) -> String {
        let mut out = String::new();
        if attrs.header_row {
            out.push_str("[options=\"header\"]\n");
        }
        out.push_str("|===\n");
        for row in rows {
            if !row.is_block(BlockKind::TableRow) {
                continue;
            }
            let mut cells: Vec<String> = Vec::new();
            for cell in row.children() {
                let text = self.emit_blocks(cell.children(), ctx);
                let flat = text.replace("\n\n", " ").replace('\n', " ");
                cells.push(format!("|{}", flat.replace('|', "\\|")));
            }
            out.push_str(&cells.join(" "));
            out.push('\n');
        }
        out.push_str("|===");
        out
    }

    fn emit_inline_run(&mut self, nodes: &[Node], ctx: &mut EmitContext) -> String {
        let refs: Vec<&Node> = nodes.iter().collect();
        self.emit_inline_nodes(&refs, ctx)
    }

    fn emit_inline_nodes(&mut self, nodes: &[&Node], ctx: &mut EmitContext) -> String {
        let mut buffer = String::new();
        for node in nodes {
            let piece = self.emit_inline(node, ctx);
            push_inline(&mut buffer, &piece);
        }
        buffer.trim().to_string()
    }

    fn emit_inline(&mut self, node: &Node, ctx: &mut EmitContext) -> String {
        match node {
            Node::Text(text) => text.clone(),
            Node::Inline { kind, children } => match kind {
                InlineKind::Strong => {
                    format!("*{}*", self.emit_inline_run(children, ctx))
                }
                InlineKind::Emphasis => {
                    format!("_{}_", self.emit_inline_run(children, ctx))
                }
                InlineKind::Monospace => {
                    format!("`{}`", self.emit_inline_run(children, ctx))
                }
                InlineKind::LineBreak => " +\n".to_string(),
                InlineKind::Image { src, alt } => format!("image:{src}[{alt}]"),
                InlineKind::Xref { anchor, display } => self.emit_xref(anchor, display),
                InlineKind::Variable { name } => self.emit_variable(name),
            },
            // A block inside an inline run: canonical trees do not produce
            // this, but degrade to plain text rather than aborting.
            other => {
                warn!("block node inside inline run, emitting as plain text");
                self.warnings.push(Warning::new(
                    WarningCode::UnknownElement,
                    "block content inside an inline run emitted as plain text",
                ));
                other.plain_text()
            }
        }
    }

    fn emit_xref(&mut self, anchor: &str, display: &str) -> String {
        match self.xrefs.get(anchor) {
            Some(target) => {
                let text = target.text.as_deref().unwrap_or(display);
                if target.path.starts_with("http://") || target.path.starts_with("https://") {
                    let mut url = target.path.clone();
                    if let Some(fragment) = &target.fragment {
                        url.push('#');
                        url.push_str(fragment);
                    }
                    format!("{url}[{text}]")
                } else {
                    match &target.fragment {
                        Some(fragment) => format!("xref:{}#{fragment}[{text}]", target.path),
                        None => format!("xref:{}[{text}]", target.path),
                    }
                }
            }
            // Unresolved: the canonicalizer already warned and counted;
            // degrade to the literal display text.
            None => display.to_string(),
        }
    }

    fn emit_variable(&mut self, name: &str) -> String {
        match self.options.variable_mode {
            VariableMode::Reference => format!("{{{}}}", variable_attr_name(name)),
            VariableMode::Flatten => match self.variables.resolve(name) {
                Some(value) => value,
                None => {
                    self.warnings.push(
                        Warning::new(
                            WarningCode::UnresolvedVariable,
                            format!("variable `{name}` has no value; emitted its name"),
                        )
                        .at(name.to_string()),
                    );
                    name.to_string()
                }
            },
        }
    }
}

fn emit_code_block(attrs: &BlockAttrs, children: &[Node]) -> String {
    let mut body = String::new();
    for child in children {
        body.push_str(&child.plain_text());
    }
    match &attrs.language {
        Some(lang) => format!("[source,{lang}]\n----\n{body}\n----"),
        None => format!("----\n{body}\n----"),
    }
}

/// Append an inline piece, collapsing a doubled space at the seam.
fn push_inline(buffer: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if buffer.ends_with(' ') && piece.starts_with(' ') {
        buffer.push_str(piece.trim_start_matches(' '));
    } else {
        buffer.push_str(piece);
    }
}

/// AsciiDoc attribute names cannot contain dots or uppercase; `Set.Name`
/// becomes `set-name`.
fn variable_attr_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Defuse paragraph lines that would parse as block syntax: a bare `+` would
/// read as a continuation, leading list/heading markers would open blocks,
/// and a run of dashes or dots would open a listing or literal fence.
fn defuse_block_syntax(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim() == "+" {
                "{plus}".to_string()
            } else if line.starts_with(". ")
                || line.starts_with("* ")
                || line.starts_with("- ")
                || line.starts_with("= ")
                || crate::postprocess::is_fence_delimiter(line)
            {
                format!("{{empty}}{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::NullVariableResolver;

    fn emit_tree(tree: &Node) -> String {
        let options = ConversionOptions::default();
        let (text, _) = emit(tree, &XrefTable::new(), &NullVariableResolver, &options);
        text
    }

    fn item(text: &str) -> Node {
        Node::list_item(vec![Node::paragraph(vec![Node::text(text)])])
    }

    #[test]
    fn ordered_markers_deepen_per_level() {
        let tree = Node::Document(vec![Node::list(
            ListStyle::Numeric,
            vec![
                item("one"),
                Node::list_item(vec![
                    Node::paragraph(vec![Node::text("two")]),
                    Node::list(ListStyle::Numeric, vec![item("nested")]),
                ]),
            ],
        )]);
        let text = emit_tree(&tree);
        assert_eq!(text, ". one\n. two\n+\n.. nested");
    }

    #[test]
    fn alpha_sublist_gets_style_directive() {
        let tree = Node::Document(vec![Node::list(
            ListStyle::LowerAlpha,
            vec![item("first")],
        )]);
        assert_eq!(emit_tree(&tree), "[loweralpha]\n. first");
    }

    #[test]
    fn multi_block_item_emits_one_continuation_per_extra_block() {
        let tree = Node::Document(vec![Node::list(
            ListStyle::Numeric,
            vec![Node::list_item(vec![
                Node::paragraph(vec![Node::text("lead")]),
                Node::paragraph(vec![Node::text("second")]),
                Node::paragraph(vec![Node::text("third")]),
            ])],
        )]);
        let text = emit_tree(&tree);
        let continuations = text.lines().filter(|l| *l == "+").count();
        assert_eq!(continuations, 2);
        assert_eq!(text, ". lead\n+\nsecond\n+\nthird");
    }

    #[test]
    fn marker_count_equals_item_count_even_for_empty_items() {
        let tree = Node::Document(vec![Node::list(
            ListStyle::Numeric,
            vec![item("one"), Node::list_item(vec![]), item("three")],
        )]);
        let text = emit_tree(&tree);
        let markers = text.lines().filter(|l| l.starts_with('.')).count();
        assert_eq!(markers, 3);
    }

    #[test]
    fn untitled_single_paragraph_admonition_uses_short_form() {
        let tree = Node::Document(vec![Node::Block {
            kind: BlockKind::Admonition,
            attrs: BlockAttrs {
                admonition: Some(AdmonitionKind::Tip),
                ..BlockAttrs::default()
            },
            children: vec![Node::paragraph(vec![Node::text("save often")])],
        }]);
        assert_eq!(emit_tree(&tree), "TIP: save often");
    }

    #[test]
    fn titled_admonition_uses_fenced_form() {
        let tree = Node::Document(vec![Node::Block {
            kind: BlockKind::Admonition,
            attrs: BlockAttrs {
                admonition: Some(AdmonitionKind::Warning),
                title: Some("Warning!".to_string()),
                ..BlockAttrs::default()
            },
            children: vec![Node::paragraph(vec![Node::text("body text")])],
        }]);
        assert_eq!(
            emit_tree(&tree),
            ".Warning!\n[WARNING]\n====\nbody text\n===="
        );
    }

    #[test]
    fn collapsible_renders_titled_fenced_block() {
        let tree = Node::Document(vec![Node::Block {
            kind: BlockKind::Collapsible,
            attrs: BlockAttrs {
                title: Some("Details".to_string()),
                ..BlockAttrs::default()
            },
            children: vec![Node::paragraph(vec![Node::text("Step X")])],
        }]);
        assert_eq!(
            emit_tree(&tree),
            ".Details\n[%collapsible]\n====\nStep X\n===="
        );
    }

    #[test]
    fn inline_and_block_media_forms() {
        let inline = Node::Document(vec![Node::paragraph(vec![
            Node::text("before "),
            Node::inline(
                InlineKind::Image {
                    src: "pic.png".into(),
                    alt: "pic".into(),
                },
                vec![],
            ),
            Node::text(" after"),
        ])]);
        assert_eq!(emit_tree(&inline), "before image:pic.png[pic] after");

        let block = Node::Document(vec![Node::Block {
            kind: BlockKind::MediaBlock,
            attrs: BlockAttrs {
                src: Some("pic.png".into()),
                alt: Some("pic".into()),
                ..BlockAttrs::default()
            },
            children: vec![],
        }]);
        assert_eq!(emit_tree(&block), "image::pic.png[pic]");
    }

    #[test]
    fn unresolved_xref_degrades_to_display_text() {
        let tree = Node::Document(vec![Node::paragraph(vec![Node::inline(
            InlineKind::Xref {
                anchor: "Missing.htm".into(),
                display: "the missing topic".into(),
            },
            vec![],
        )])]);
        assert_eq!(emit_tree(&tree), "the missing topic");
    }

    #[test]
    fn variable_reference_and_flatten_modes() {
        let tree = Node::Document(vec![Node::paragraph(vec![Node::inline(
            InlineKind::Variable {
                name: "General.CompanyName".into(),
            },
            vec![],
        )])]);
        assert_eq!(emit_tree(&tree), "{general-companyname}");

        let mut options = ConversionOptions::default();
        options.variable_mode = VariableMode::Flatten;
        let vars = crate::resolve::MapVariableResolver::from([("General.CompanyName", "Acme")]);
        let (text, warnings) = emit(&tree, &XrefTable::new(), &vars, &options);
        assert_eq!(text, "Acme");
        assert!(warnings.is_empty());
    }

    #[test]
    fn flatten_mode_warns_on_undefined_variable() {
        let tree = Node::Document(vec![Node::paragraph(vec![Node::inline(
            InlineKind::Variable {
                name: "General.Missing".into(),
            },
            vec![],
        )])]);
        let mut options = ConversionOptions::default();
        options.variable_mode = VariableMode::Flatten;
        let (text, warnings) = emit(&tree, &XrefTable::new(), &NullVariableResolver, &options);
        assert_eq!(text, "General.Missing");
        assert_eq!(warnings[0].code, WarningCode::UnresolvedVariable);
    }

    #[test]
    fn bare_plus_line_is_defused() {
        assert_eq!(defuse_block_syntax("+"), "{plus}");
        assert_eq!(defuse_block_syntax("a + b"), "a + b");
        assert_eq!(defuse_block_syntax(". looks like a list"), "{empty}. looks like a list");
    }

    #[test]
    fn literal_fence_lines_in_prose_are_defused() {
        assert_eq!(defuse_block_syntax("----"), "{empty}----");
        assert_eq!(defuse_block_syntax("....."), "{empty}.....");
        assert_eq!(defuse_block_syntax("---"), "---");
    }
}
