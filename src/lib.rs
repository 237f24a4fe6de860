//! Flare XHTML to AsciiDoc conversion pipeline.
//!
//! MadCap Flare topics are XHTML with proprietary block and inline
//! extensions (dropdowns, snippets, variables, conditional text). The
//! pipeline converts one topic at a time:
//!
//! 1. Parse the raw markup (html5ever, tolerant of tag soup).
//! 2. **Canonicalize**: map the irregular vocabulary onto a closed node kind
//!    set, inline snippets, filter conditional content, and repair
//!    structurally invalid patterns (stray block children in lists, sibling
//!    lists that are semantically nested).
//! 3. **Emit**: one depth-first walk producing AsciiDoc, threading explicit
//!    list/admonition context and inserting `+` continuation markers so
//!    multi-block list items stay attached.
//! 4. **Post-lint**: an idempotent text pass normalizing blank lines,
//!    emphasis spacing and list punctuation.
//!
//! Conversions are independent: no shared mutable state, so a batch driver
//! may convert documents concurrently with plain per-document calls.
//!
//! # Usage
//!
//! ```rust
//! use flare2adoc::{ConversionOptions, convert_topic};
//!
//! let html = "<html><body><h1>Install</h1><p>Run the installer.</p></body></html>";
//! let result = convert_topic(html, &ConversionOptions::default())?;
//! assert_eq!(result.text, "= Install\n\nRun the installer.\n");
//! # Ok::<(), flare2adoc::ConvertError>(())
//! ```

pub mod canonicalize;
pub mod emit;
mod error;
mod options;
mod parser;
pub mod postprocess;
pub mod resolve;
pub mod tree;

pub use error::{Conversion, ConversionMetadata, ConvertError, Warning, WarningCode};
pub use options::{ConversionOptions, VariableMode};
pub use resolve::{
    CrossRefResolver, FileSnippetResolver, MapVariableResolver, NullCrossRefResolver,
    NullSnippetResolver, NullVariableResolver, RelativeCrossRefResolver, SnippetResolver,
    VariableResolver, XrefTable, XrefTarget,
};

use log::debug;

/// Converts topics with a fixed set of options and resolver collaborators.
///
/// [`Converter::new`] wires the default collaborators: filesystem snippet
/// resolution under `options.base_path` (or none without a base path), an
/// empty variable table and extension-rewriting cross-reference resolution.
/// Builder-style setters substitute custom ones.
pub struct Converter {
    options: ConversionOptions,
    snippets: Box<dyn SnippetResolver>,
    variables: Box<dyn VariableResolver>,
    xrefs: Box<dyn CrossRefResolver>,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        let snippets: Box<dyn SnippetResolver> = match &options.base_path {
            Some(base) => Box::new(FileSnippetResolver::new(base.clone())),
            None => Box::new(NullSnippetResolver),
        };
        Self {
            options,
            snippets,
            variables: Box::new(NullVariableResolver),
            xrefs: Box::new(RelativeCrossRefResolver),
        }
    }

    pub fn with_snippet_resolver(mut self, snippets: impl SnippetResolver + 'static) -> Self {
        self.snippets = Box::new(snippets);
        self
    }

    pub fn with_variable_resolver(mut self, variables: impl VariableResolver + 'static) -> Self {
        self.variables = Box::new(variables);
        self
    }

    pub fn with_cross_ref_resolver(mut self, xrefs: impl CrossRefResolver + 'static) -> Self {
        self.xrefs = Box::new(xrefs);
        self
    }

    /// Convert one topic. Only an unparseable input fails; every other
    /// anomaly degrades to a warning and the text is always usable.
    pub fn convert(&self, html: &str) -> Result<Conversion, ConvertError> {
        let dom = parser::parse_topic(html)?;
        let canonical =
            canonicalize::canonicalize(&dom, &self.options, &*self.snippets, &*self.xrefs);
        let mut warnings = canonical.warnings;

        let (text, emit_warnings) = emit::emit(
            &canonical.tree,
            &canonical.xrefs,
            &*self.variables,
            &self.options,
        );
        warnings.extend(emit_warnings);

        let text = if self.options.post_lint {
            postprocess::lint(&text)
        } else {
            text
        };

        debug!(
            "converted topic: {} bytes out, {} warning(s)",
            text.len(),
            warnings.len()
        );
        Ok(Conversion {
            text,
            warnings,
            metadata: canonical.metadata,
        })
    }
}

/// Convert one topic with default collaborators.
pub fn convert_topic(
    html: &str,
    options: &ConversionOptions,
) -> Result<Conversion, ConvertError> {
    Converter::new(options.clone()).convert(html)
}
