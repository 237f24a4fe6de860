//! Error and diagnostic types for the conversion pipeline.
//!
//! Only [`ConvertError::FatalParse`] aborts a conversion. Everything else the
//! pipeline encounters is downgraded to a best-effort repair plus a
//! [`Warning`] carried in the [`Conversion`] result, so callers always get
//! usable output alongside the full diagnostic list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conversion failures.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input could not be treated as a document tree at all.
    #[error("fatal parse error: {message}")]
    FatalParse { message: String },
}

/// Non-fatal diagnostic codes.
///
/// Conditional-content removal is intentional data loss and is therefore
/// counted in [`ConversionMetadata`] rather than warned about per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// A snippet reference could not be resolved; a placeholder block was
    /// emitted in its place.
    UnresolvedSnippet,
    /// A variable had no value in flatten mode; the raw name was emitted.
    UnresolvedVariable,
    /// A cross-reference target could not be resolved; the display text was
    /// emitted literally.
    UnresolvedXref,
    /// The sibling-list nesting heuristic fired. Recorded on every
    /// re-parenting decision so the policy can be audited.
    AmbiguousListNesting,
    /// An unsupported source element; its children were emitted as inline
    /// content and the wrapping tag dropped.
    UnknownElement,
}

/// A recoverable anomaly encountered during conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    /// Best-effort source location, e.g. a tag name or a snippet path.
    pub location: Option<String>,
}

impl Warning {
    pub(crate) fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{:?}: {} ({})", self.code, self.message, loc),
            None => write!(f, "{:?}: {}", self.code, self.message),
        }
    }
}

/// Counters for observable, intentional degradations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionMetadata {
    /// Nodes removed because their condition matched the exclusion profile.
    pub filtered_conditional_count: usize,
    /// Cross-references that fell back to literal display text.
    pub unresolved_xref_count: usize,
    /// Snippet references replaced by a visible placeholder.
    pub unresolved_snippet_count: usize,
}

/// The result of converting one topic: the produced AsciiDoc text plus the
/// full diagnostic trail. The text is always usable, even when imperfect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub text: String,
    pub warnings: Vec<Warning>,
    pub metadata: ConversionMetadata,
}
