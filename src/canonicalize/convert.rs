//! Source vocabulary to canonical kinds.
//!
//! html5ever lowercases the proprietary `MadCap:` element names, so the
//! dialect arrives here as `madcap:dropdown`, `madcap:variable` and so on.
//! Everything the emitter will ever see is decided in this pass: the closed
//! node kind, admonition titles pulled out of lead spans, the one-time
//! inline-vs-block placement of images, snippet bodies spliced in place and
//! conditional content removed.

use std::borrow::Cow;

use html5ever::Attribute;
use log::{debug, warn};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use phf::phf_set;

use crate::error::{ConversionMetadata, Warning, WarningCode};
use crate::options::ConversionOptions;
use crate::parser;
use crate::resolve::{CrossRefResolver, SnippetResolver, XrefTable};
use crate::tree::{AdmonitionKind, BlockAttrs, BlockKind, InlineKind, ListStyle, Node};

/// Cap on transitive snippet inclusion, so a self-referencing snippet
/// degrades to an unresolved reference instead of recursing forever.
const MAX_SNIPPET_DEPTH: usize = 8;

/// Elements whose subtrees carry no content for the output.
static DROPPED_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "head",
    "title",
    "meta",
    "link",
    "base",
    "script",
    "style",
    "form",
    "input",
    "button",
    "select",
    "iframe",
    "col",
    "colgroup",
};

/// Elements that contribute nothing themselves; their children are spliced
/// through without a warning.
static TRANSPARENT_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "html",
    "body",
    "div",
    "span",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "nav",
    "figure",
    "figcaption",
    "center",
    "font",
    "small",
    "u",
    "sup",
    "sub",
    "madcap:conditionaltext",
    "madcap:dropdownhead",
    "madcap:dropdownhotspot",
    "madcap:dropdownbody",
    "madcap:popup",
    "madcap:popupbody",
    "madcap:popuphead",
    "thead",
    "tbody",
    "tfoot",
    "tr",
    "td",
    "th",
    "caption",
};

/// Lead elements whose text is consumed as an admonition title.
static TITLE_LEAD_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "span", "b", "strong", "i", "em",
};

pub(super) struct TreeBuilder<'a> {
    options: &'a ConversionOptions,
    snippets: &'a dyn SnippetResolver,
    xref_resolver: &'a dyn CrossRefResolver,
    warnings: Vec<Warning>,
    metadata: ConversionMetadata,
    xrefs: XrefTable,
    snippet_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    pub(super) fn new(
        options: &'a ConversionOptions,
        snippets: &'a dyn SnippetResolver,
        xref_resolver: &'a dyn CrossRefResolver,
    ) -> Self {
        Self {
            options,
            snippets,
            xref_resolver,
            warnings: Vec::new(),
            metadata: ConversionMetadata::default(),
            xrefs: XrefTable::new(),
            snippet_depth: 0,
        }
    }

    pub(super) fn finish(self) -> (XrefTable, Vec<Warning>, ConversionMetadata) {
        (self.xrefs, self.warnings, self.metadata)
    }

    pub(super) fn convert_document(&mut self, dom: &RcDom) -> Node {
        let nodes = match parser::find_body(&dom.document) {
            Some(body) => self.convert_children(&body, false),
            None => Vec::new(),
        };
        let blocks = self.into_blocks(nodes);
        Node::Document(blocks)
    }

    fn convert_children(&mut self, node: &Handle, pre: bool) -> Vec<Node> {
        let kids: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        let mut out = Vec::new();
        for child in &kids {
            out.extend(self.convert_node(child, pre));
        }
        out
    }

    fn convert_node(&mut self, node: &Handle, pre: bool) -> Vec<Node> {
        match &node.data {
            NodeData::Text { contents } => {
                let borrowed = contents.borrow();
                let text: &str = borrowed.as_ref();
                if pre {
                    vec![Node::text(text)]
                } else {
                    let compressed = compress_whitespace(text);
                    if compressed.is_empty() {
                        Vec::new()
                    } else {
                        vec![Node::text(compressed.into_owned())]
                    }
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.to_ascii_lowercase();
                let attrs = attrs.borrow();
                if self.condition_excluded(&attrs) {
                    self.metadata.filtered_conditional_count += 1;
                    debug!("filtered conditional element <{tag}>");
                    return Vec::new();
                }
                self.convert_element(&tag, &attrs, node, pre)
            }
            // Comments, doctypes and processing instructions have no
            // counterpart in the output.
            _ => Vec::new(),
        }
    }

    fn convert_element(
        &mut self,
        tag: &str,
        attrs: &[Attribute],
        node: &Handle,
        pre: bool,
    ) -> Vec<Node> {
        if DROPPED_ELEMENTS.contains(tag) {
            return Vec::new();
        }

        match tag {
            "p" => {
                if let Some(kind) = admonition_kind(attrs) {
                    return vec![self.convert_admonition(kind, node)];
                }
                let children = self.convert_children(node, pre);
                self.into_blocks(children)
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.as_bytes()[1] - b'0';
                let children = self.convert_children(node, pre);
                vec![Node::Block {
                    kind: BlockKind::Heading,
                    attrs: BlockAttrs {
                        level,
                        ..BlockAttrs::default()
                    },
                    children,
                }]
            }
            "ol" | "ul" => {
                let style = list_style_for(tag, attrs);
                let children: Vec<Node> = self
                    .convert_children(node, pre)
                    .into_iter()
                    .filter(|n| !n.is_whitespace_only())
                    .collect();
                vec![Node::list(style, children)]
            }
            "li" => {
                let children = self.convert_children(node, pre);
                vec![Node::list_item(self.into_blocks(children))]
            }
            "table" => vec![self.convert_table(node)],
            "pre" => vec![self.convert_code_block(node)],
            "code" => {
                // Inline code; <pre><code> is consumed by the pre branch.
                let children = self.convert_children(node, pre);
                vec![Node::inline(InlineKind::Monospace, children)]
            }
            "blockquote" => {
                let children = self.convert_children(node, pre);
                let body = self.into_blocks(children);
                vec![Node::block(BlockKind::Quote, body)]
            }
            "hr" => vec![Node::block(BlockKind::ThematicBreak, Vec::new())],
            "br" => vec![Node::inline(InlineKind::LineBreak, Vec::new())],
            "b" | "strong" => {
                let children = self.convert_children(node, pre);
                vec![Node::inline(InlineKind::Strong, children)]
            }
            "i" | "em" => {
                let children = self.convert_children(node, pre);
                vec![Node::inline(InlineKind::Emphasis, children)]
            }
            "img" => self.convert_image(attrs),
            "a" | "madcap:xref" => self.convert_xref(attrs, node, pre),
            // The Flare dialect writes these self-closing; the HTML parser
            // then treats them as open elements and swallows the following
            // siblings as children, so those are spliced back out.
            "madcap:variable" => {
                let mut nodes = self.convert_variable(attrs, node);
                nodes.extend(self.convert_children(node, pre));
                nodes
            }
            "madcap:snippetblock" => {
                let mut nodes = self.convert_snippet(get_attr(attrs, "src"));
                nodes.extend(self.convert_children(node, pre));
                self.into_blocks(nodes)
            }
            "madcap:snippettext" => {
                let mut nodes = self.convert_snippet(get_attr(attrs, "src"));
                nodes.extend(self.convert_children(node, pre));
                nodes
            }
            "madcap:pagebreak" | "madcap:keyword" | "madcap:concept" => {
                self.convert_children(node, pre)
            }
            "madcap:dropdown" => vec![self.convert_dropdown(node)],
            "div" => {
                if let Some(kind) = admonition_kind(attrs) {
                    return vec![self.convert_admonition(kind, node)];
                }
                if has_class(attrs, "dropdown") {
                    return vec![self.convert_dropdown(node)];
                }
                self.convert_children(node, pre)
            }
            "span" => {
                if has_class(attrs, "keyboard") || has_class(attrs, "code") || has_class(attrs, "mono")
                {
                    let children = self.convert_children(node, pre);
                    return vec![Node::inline(InlineKind::Monospace, children)];
                }
                self.convert_children(node, pre)
            }
            _ if TRANSPARENT_ELEMENTS.contains(tag) => self.convert_children(node, pre),
            _ => {
                // Unknown source construct: keep its content as inline text,
                // drop the wrapping tag, record the degradation.
                warn!("unknown element <{tag}>, emitting children as inline content");
                self.warnings.push(
                    Warning::new(
                        WarningCode::UnknownElement,
                        format!("unsupported element <{tag}> flattened to its content"),
                    )
                    .at(tag.to_string()),
                );
                self.convert_children(node, pre)
            }
        }
    }

    /// The inline-vs-block decision for an image is *not* made here: the
    /// image starts inline and [`Self::into_blocks`] promotes a lone image
    /// paragraph to a media block. That promotion happens exactly once, in
    /// this pass; the emitter only reads the result.
    fn convert_image(&mut self, attrs: &[Attribute]) -> Vec<Node> {
        if !self.options.preserve_images {
            return Vec::new();
        }
        let Some(src) = get_attr(attrs, "src").filter(|s| !s.is_empty()) else {
            return Vec::new();
        };
        let alt = get_attr(attrs, "alt").unwrap_or_default();
        vec![Node::inline(InlineKind::Image { src, alt }, Vec::new())]
    }

    fn convert_xref(&mut self, attrs: &[Attribute], node: &Handle, pre: bool) -> Vec<Node> {
        let Some(href) = get_attr(attrs, "href").filter(|h| !h.is_empty()) else {
            // A named anchor or an empty link: keep the content only.
            return self.convert_children(node, pre);
        };
        let mut display = raw_text(node);
        if display.is_empty() {
            display = href.clone();
        }
        if !self.xrefs.contains_key(&href) {
            match self.xref_resolver.resolve(&href) {
                Some(target) => {
                    self.xrefs.insert(href.clone(), target);
                }
                None => {
                    self.metadata.unresolved_xref_count += 1;
                    self.warnings.push(
                        Warning::new(
                            WarningCode::UnresolvedXref,
                            format!("cross-reference target `{href}` not resolved; keeping display text"),
                        )
                        .at(href.clone()),
                    );
                }
            }
        }
        vec![Node::inline(
            InlineKind::Xref {
                anchor: href,
                display,
            },
            Vec::new(),
        )]
    }

    fn convert_variable(&mut self, attrs: &[Attribute], node: &Handle) -> Vec<Node> {
        let name = get_attr(attrs, "name")
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| raw_text(node));
        if name.is_empty() {
            self.warnings.push(Warning::new(
                WarningCode::UnresolvedVariable,
                "variable reference without a name dropped",
            ));
            return Vec::new();
        }
        vec![Node::inline(InlineKind::Variable { name }, Vec::new())]
    }

    fn convert_snippet(&mut self, src: Option<String>) -> Vec<Node> {
        let Some(src) = src.filter(|s| !s.is_empty()) else {
            return self.unresolved_snippet("<unnamed>");
        };
        if self.snippet_depth >= MAX_SNIPPET_DEPTH {
            warn!("snippet nesting deeper than {MAX_SNIPPET_DEPTH}, treating {src} as unresolved");
            return self.unresolved_snippet(&src);
        }
        let Some(markup) = self.snippets.resolve(&src) else {
            return self.unresolved_snippet(&src);
        };
        let Ok(dom) = parser::parse_topic(&markup) else {
            return self.unresolved_snippet(&src);
        };
        let Some(body) = parser::find_body(&dom.document) else {
            return self.unresolved_snippet(&src);
        };
        self.snippet_depth += 1;
        let nodes = self.convert_children(&body, false);
        self.snippet_depth -= 1;
        nodes
    }

    /// A missing snippet becomes a visible placeholder, never an empty node.
    fn unresolved_snippet(&mut self, src: &str) -> Vec<Node> {
        self.metadata.unresolved_snippet_count += 1;
        self.warnings.push(
            Warning::new(
                WarningCode::UnresolvedSnippet,
                format!("snippet `{src}` unavailable; emitted placeholder"),
            )
            .at(src.to_string()),
        );
        vec![Node::paragraph(vec![Node::text(format!(
            "[MISSING SNIPPET: {src}]"
        ))])]
    }

    fn convert_dropdown(&mut self, node: &Handle) -> Node {
        let kids: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        let mut title = None;
        let mut body_nodes = Vec::new();
        for child in &kids {
            match element_tag(child).as_deref() {
                Some("madcap:dropdownhead") => {
                    let text = raw_text(child);
                    if !text.is_empty() {
                        title = Some(text);
                    }
                }
                Some("madcap:dropdownbody") => {
                    body_nodes.extend(self.convert_children(child, false));
                }
                // Prose interleaved with the head/body pair stays in the body.
                _ => body_nodes.extend(self.convert_node(child, false)),
            }
        }
        let children = self.into_blocks(body_nodes);
        Node::Block {
            kind: BlockKind::Collapsible,
            attrs: BlockAttrs {
                title,
                ..BlockAttrs::default()
            },
            children,
        }
    }

    /// Build an admonition block, consuming a title-bearing lead node.
    ///
    /// The lead is either a styled inline element directly under the
    /// admonition container, or the same at the start of its first paragraph.
    /// Its text becomes the title and is removed from the body, so it can
    /// never appear twice.
    fn convert_admonition(&mut self, kind: AdmonitionKind, node: &Handle) -> Node {
        let kids: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        let mut title = None;
        let mut body_nodes = Vec::new();
        let mut lead_consumed = false;

        for child in &kids {
            if !lead_consumed && !is_meaningless(child) {
                match element_tag(child).as_deref() {
                    Some(tag) if TITLE_LEAD_ELEMENTS.contains(tag) => {
                        title = clean_title(&raw_text(child));
                        lead_consumed = true;
                        continue;
                    }
                    Some("p") => {
                        let (p_title, p_rest) = self.split_lead_paragraph(child);
                        title = p_title;
                        body_nodes.extend(p_rest);
                        lead_consumed = true;
                        continue;
                    }
                    _ => lead_consumed = true,
                }
            }
            body_nodes.extend(self.convert_node(child, false));
        }

        let children = self.into_blocks(body_nodes);
        Node::Block {
            kind: BlockKind::Admonition,
            attrs: BlockAttrs {
                title,
                admonition: Some(kind),
                ..BlockAttrs::default()
            },
            children,
        }
    }

    /// Split a paragraph that may open with a styled title span. Returns the
    /// consumed title (if any) and the converted remainder of the paragraph.
    fn split_lead_paragraph(&mut self, p: &Handle) -> (Option<String>, Vec<Node>) {
        let kids: Vec<Handle> = p.children.borrow().iter().cloned().collect();
        let mut title = None;
        let mut rest = Vec::new();
        let mut lead_checked = false;
        for child in &kids {
            if !lead_checked && !is_meaningless(child) {
                lead_checked = true;
                if let Some(tag) = element_tag(child)
                    && TITLE_LEAD_ELEMENTS.contains(tag.as_str())
                {
                    title = clean_title(&raw_text(child));
                    continue;
                }
            }
            rest.extend(self.convert_node(child, false));
        }
        (title, self.into_blocks(rest))
    }

    fn convert_table(&mut self, node: &Handle) -> Node {
        let mut header_row = false;
        let mut rows = Vec::new();
        self.collect_rows(node, &mut rows, &mut header_row, false);
        Node::Block {
            kind: BlockKind::Table,
            attrs: BlockAttrs {
                header_row,
                ..BlockAttrs::default()
            },
            children: rows,
        }
    }

    fn collect_rows(
        &mut self,
        node: &Handle,
        rows: &mut Vec<Node>,
        header_row: &mut bool,
        in_thead: bool,
    ) {
        let kids: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        for child in &kids {
            match element_tag(child).as_deref() {
                Some("thead") => {
                    self.collect_rows(child, rows, header_row, true);
                }
                Some("tbody") | Some("tfoot") => {
                    self.collect_rows(child, rows, header_row, false);
                }
                Some("tr") => {
                    let (row, all_header_cells) = self.convert_row(child);
                    if (in_thead || (rows.is_empty() && all_header_cells))
                        && !row.children().is_empty()
                    {
                        *header_row = true;
                    }
                    rows.push(row);
                }
                _ => {}
            }
        }
    }

    fn convert_row(&mut self, tr: &Handle) -> (Node, bool) {
        let kids: Vec<Handle> = tr.children.borrow().iter().cloned().collect();
        let mut cells = Vec::new();
        let mut all_header = true;
        for child in &kids {
            match element_tag(child).as_deref() {
                Some(tag @ ("td" | "th")) => {
                    if tag != "th" {
                        all_header = false;
                    }
                    let content = self.convert_children(child, false);
                    cells.push(Node::block(BlockKind::TableCell, self.into_blocks(content)));
                }
                _ => {}
            }
        }
        let any = !cells.is_empty();
        (Node::block(BlockKind::TableRow, cells), all_header && any)
    }

    fn convert_code_block(&mut self, pre: &Handle) -> Node {
        let language = code_language(pre);
        let mut text = String::new();
        collect_raw_text(pre, &mut text);
        let text = text.trim_matches('\n').to_string();
        Node::Block {
            kind: BlockKind::CodeBlock,
            attrs: BlockAttrs {
                language,
                ..BlockAttrs::default()
            },
            children: vec![Node::Text(text)],
        }
    }

    /// Group converted children for a block context: consecutive inline nodes
    /// become paragraphs, whitespace-only runs vanish, and a paragraph that is
    /// nothing but one image is promoted to a media block.
    fn into_blocks(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::new();
        let mut run: Vec<Node> = Vec::new();
        for node in nodes {
            if node.is_block_level() {
                flush_inline_run(&mut run, &mut out);
                out.push(node);
            } else {
                run.push(node);
            }
        }
        flush_inline_run(&mut run, &mut out);
        out
    }

    fn condition_excluded(&self, attrs: &[Attribute]) -> bool {
        let Some(conditions) =
            get_attr(attrs, "madcap:conditions").or_else(|| get_attr(attrs, "data-mc-conditions"))
        else {
            return false;
        };
        conditions
            .split([',', ';'])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .any(|c| {
                self.options
                    .exclude_conditions
                    .iter()
                    .any(|excluded| excluded.eq_ignore_ascii_case(c))
            })
    }
}

fn flush_inline_run(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    if run.iter().all(Node::is_whitespace_only) {
        run.clear();
        return;
    }
    let mut nodes = std::mem::take(run);
    // Trim whitespace-only edges of the run.
    while nodes.first().is_some_and(Node::is_whitespace_only) {
        nodes.remove(0);
    }
    while nodes.last().is_some_and(Node::is_whitespace_only) {
        nodes.pop();
    }
    out.push(paragraph_or_media(nodes));
}

/// A paragraph consisting solely of one image renders as a standalone media
/// block; an image with non-whitespace inline siblings stays inline.
fn paragraph_or_media(nodes: Vec<Node>) -> Node {
    let mut visible = nodes.iter().filter(|n| !n.is_whitespace_only());
    if let (Some(Node::Inline { kind: InlineKind::Image { src, alt }, .. }), None) =
        (visible.next(), visible.next())
    {
        return Node::Block {
            kind: BlockKind::MediaBlock,
            attrs: BlockAttrs {
                src: Some(src.clone()),
                alt: Some(alt.clone()),
                ..BlockAttrs::default()
            },
            children: Vec::new(),
        };
    }
    Node::paragraph(nodes)
}

fn get_attr(attrs: &[Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|a| (*a.name.local).eq_ignore_ascii_case(name))
        .map(|a| a.value.to_string())
}

fn has_class(attrs: &[Attribute], token: &str) -> bool {
    get_attr(attrs, "class").is_some_and(|classes| {
        classes
            .split_whitespace()
            .any(|c| c.to_ascii_lowercase().contains(token))
    })
}

fn admonition_kind(attrs: &[Attribute]) -> Option<AdmonitionKind> {
    let classes = get_attr(attrs, "class")?;
    for class in classes.split_whitespace() {
        let class = class.to_ascii_lowercase();
        if class.contains("caution") {
            return Some(AdmonitionKind::Caution);
        }
        if class.contains("warning") {
            return Some(AdmonitionKind::Warning);
        }
        if class.contains("tip") {
            return Some(AdmonitionKind::Tip);
        }
        if class.contains("note") {
            return Some(AdmonitionKind::Note);
        }
    }
    None
}

fn list_style_for(tag: &str, attrs: &[Attribute]) -> ListStyle {
    if tag == "ul" {
        return ListStyle::Bullet;
    }
    let style = get_attr(attrs, "style").unwrap_or_default().to_lowercase();
    if style.contains("lower-alpha") || style.contains("lower-latin") {
        return ListStyle::LowerAlpha;
    }
    if style.contains("upper-alpha") || style.contains("upper-latin") {
        return ListStyle::UpperAlpha;
    }
    match get_attr(attrs, "type").as_deref() {
        Some("a") => ListStyle::LowerAlpha,
        Some("A") => ListStyle::UpperAlpha,
        _ => ListStyle::Numeric,
    }
}

fn element_tag(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

fn is_meaningless(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => contents.borrow().trim().is_empty(),
        NodeData::Comment { .. } => true,
        _ => false,
    }
}

/// Raw text of a subtree, whitespace-compressed and trimmed.
fn raw_text(node: &Handle) -> String {
    let mut out = String::new();
    collect_raw_text(node, &mut out);
    compress_whitespace(&out).trim().to_string()
}

fn collect_raw_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(contents.borrow().as_ref());
    }
    for child in node.children.borrow().iter() {
        collect_raw_text(child, out);
    }
}

/// Strip the separator Flare authors put after lead labels ("Note:"), but
/// keep expressive punctuation ("Warning!").
fn clean_title(text: &str) -> Option<String> {
    let cleaned = text.trim().trim_end_matches(':').trim_end();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn code_language(pre: &Handle) -> Option<String> {
    fn from_attrs(node: &Handle) -> Option<String> {
        if let NodeData::Element { attrs, .. } = &node.data {
            let classes = get_attr(&attrs.borrow(), "class")?;
            for class in classes.split_whitespace() {
                if let Some(lang) = class
                    .strip_prefix("language-")
                    .or_else(|| class.strip_prefix("source-"))
                {
                    return Some(lang.to_string());
                }
            }
        }
        None
    }

    if let Some(lang) = from_attrs(pre) {
        return Some(lang);
    }
    for child in pre.children.borrow().iter() {
        if element_tag(child).as_deref() == Some("code")
            && let Some(lang) = from_attrs(child)
        {
            return Some(lang);
        }
    }
    None
}

/// Collapse whitespace runs to single spaces, allocating only when the input
/// actually needs it.
fn compress_whitespace(text: &str) -> Cow<'_, str> {
    let needs_work = {
        let mut prev_ws = false;
        let mut found = false;
        for c in text.chars() {
            let ws = c.is_whitespace();
            if ws && (prev_ws || c != ' ') {
                found = true;
                break;
            }
            prev_ws = ws;
        }
        found
    };
    if !needs_work {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut prev_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_ws {
                out.push(' ');
            }
            prev_ws = true;
        } else {
            out.push(c);
            prev_ws = false;
        }
    }
    Cow::Owned(out)
}
