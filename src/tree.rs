//! The canonical document tree.
//!
//! The canonicalizer resolves Flare's irregular tag vocabulary into this
//! closed set of node kinds; the emitter dispatches over it and never sees a
//! raw tag name. Invariant after canonicalization: a [`BlockKind::List`]
//! node's direct children are exclusively [`BlockKind::ListItem`] nodes.

/// A node in the canonical tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document(Vec<Node>),
    Block {
        kind: BlockKind,
        attrs: BlockAttrs,
        children: Vec<Node>,
    },
    Inline {
        kind: InlineKind,
        children: Vec<Node>,
    },
    Text(String),
}

/// Block-level node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    List,
    ListItem,
    Admonition,
    Collapsible,
    Table,
    TableRow,
    TableCell,
    MediaBlock,
    Heading,
    CodeBlock,
    Quote,
    ThematicBreak,
}

/// Inline-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineKind {
    Emphasis,
    Strong,
    Monospace,
    LineBreak,
    /// An image keeping inline placement. The inline-vs-block decision is
    /// made once during canonicalization and never re-derived.
    Image { src: String, alt: String },
    /// A cross-reference, resolved against the xref table at emission.
    Xref { anchor: String, display: String },
    /// A named variable placeholder; rendering is deferred to the emitter.
    Variable { name: String },
}

/// List numbering scheme, fixed when the emitter pushes a list frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Bullet,
    Numeric,
    LowerAlpha,
    UpperAlpha,
}

/// Admonition flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionKind {
    Note,
    Tip,
    Warning,
    Caution,
}

impl AdmonitionKind {
    /// The AsciiDoc type keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            AdmonitionKind::Note => "NOTE",
            AdmonitionKind::Tip => "TIP",
            AdmonitionKind::Warning => "WARNING",
            AdmonitionKind::Caution => "CAUTION",
        }
    }
}

/// Style hints attached to a block node. Only the fields relevant to the
/// block's kind are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAttrs {
    /// Numbering scheme, on `List` blocks.
    pub list_style: Option<ListStyle>,
    /// Consumed lead title, on `Admonition` and `Collapsible` blocks. Never
    /// duplicated in the children.
    pub title: Option<String>,
    /// Admonition flavor, on `Admonition` blocks.
    pub admonition: Option<AdmonitionKind>,
    /// Heading level 1..=6, on `Heading` blocks.
    pub level: u8,
    /// Source language hint, on `CodeBlock` blocks.
    pub language: Option<String>,
    /// Media source path, on `MediaBlock` blocks.
    pub src: Option<String>,
    /// Media alternative text, on `MediaBlock` blocks.
    pub alt: Option<String>,
    /// Whether the first row is a header row, on `Table` blocks.
    pub header_row: bool,
}

impl Node {
    pub fn text(s: impl Into<String>) -> Node {
        Node::Text(s.into())
    }

    pub fn block(kind: BlockKind, children: Vec<Node>) -> Node {
        Node::Block {
            kind,
            attrs: BlockAttrs::default(),
            children,
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Node {
        Node::block(BlockKind::Paragraph, children)
    }

    pub fn list_item(children: Vec<Node>) -> Node {
        Node::block(BlockKind::ListItem, children)
    }

    pub fn list(style: ListStyle, children: Vec<Node>) -> Node {
        Node::Block {
            kind: BlockKind::List,
            attrs: BlockAttrs {
                list_style: Some(style),
                ..BlockAttrs::default()
            },
            children,
        }
    }

    pub fn inline(kind: InlineKind, children: Vec<Node>) -> Node {
        Node::Inline { kind, children }
    }

    /// Whether this node is a block-level node of the given kind.
    pub fn is_block(&self, kind: BlockKind) -> bool {
        matches!(self, Node::Block { kind: k, .. } if *k == kind)
    }

    /// Whether this node carries any block-level structure at all.
    pub fn is_block_level(&self) -> bool {
        matches!(self, Node::Block { .. })
    }

    /// Child nodes, if any.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(children)
            | Node::Block { children, .. }
            | Node::Inline { children, .. } => children,
            Node::Text(_) => &[],
        }
    }

    /// Concatenated text content of this subtree, without markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Inline { kind, children } => {
                if let InlineKind::Variable { name } = kind {
                    out.push_str(name);
                } else {
                    for child in children {
                        child.collect_text(out);
                    }
                }
            }
            Node::Document(children) | Node::Block { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Whether the subtree contains no visible text content.
    pub fn is_whitespace_only(&self) -> bool {
        match self {
            Node::Text(t) => t.trim().is_empty(),
            Node::Inline { kind, children } => match kind {
                InlineKind::Image { .. }
                | InlineKind::Xref { .. }
                | InlineKind::Variable { .. }
                | InlineKind::LineBreak => false,
                _ => children.iter().all(Node::is_whitespace_only),
            },
            Node::Block { .. } | Node::Document(_) => false,
        }
    }
}
