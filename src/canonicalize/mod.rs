//! DOM normalization: raw Flare markup to the canonical tree.
//!
//! Two stages. `convert` maps the irregular source vocabulary (including the
//! `MadCap:` dialect) onto the closed [`crate::tree::Node`] kind set, inlining
//! snippets and filtering conditional content as it goes. `repair` then fixes
//! structurally invalid patterns the authoring tool emits — stray block
//! children inside lists, semantically nested sibling lists — as an explicit
//! fixpoint loop. The result always satisfies the canonical-tree invariants;
//! anomalies become warnings, never failures.

mod convert;
mod repair;

pub use repair::repair_tree;

use markup5ever_rcdom::RcDom;

use crate::error::{ConversionMetadata, Warning};
use crate::options::ConversionOptions;
use crate::resolve::{CrossRefResolver, SnippetResolver, XrefTable};
use crate::tree::Node;

/// A canonicalized document plus everything learned while normalizing it.
pub(crate) struct CanonicalDocument {
    pub tree: Node,
    pub xrefs: XrefTable,
    pub warnings: Vec<Warning>,
    pub metadata: ConversionMetadata,
}

/// Normalize a parsed DOM into a canonical tree. Total: structural anomalies
/// degrade to repairs plus warnings.
pub(crate) fn canonicalize(
    dom: &RcDom,
    options: &ConversionOptions,
    snippets: &dyn SnippetResolver,
    xref_resolver: &dyn CrossRefResolver,
) -> CanonicalDocument {
    let mut converter = convert::TreeBuilder::new(options, snippets, xref_resolver);
    let mut tree = converter.convert_document(dom);
    let (xrefs, mut warnings, metadata) = converter.finish();
    warnings.extend(repair_tree(&mut tree));
    CanonicalDocument {
        tree,
        xrefs,
        warnings,
        metadata,
    }
}
