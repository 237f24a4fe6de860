//! Configuration for the conversion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How named variable placeholders are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableMode {
    /// Keep a target-native attribute reference, e.g. `{general-companyname}`.
    #[default]
    Reference,
    /// Substitute the resolved literal value at emission time.
    Flatten,
}

/// Configuration options for Flare-to-AsciiDoc conversion.
///
/// Controls source-side filtering (condition profile), resource resolution
/// (base path for snippets and cross-references) and output shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// How `MadCap:variable` placeholders are rendered (default: `Reference`).
    pub variable_mode: VariableMode,

    /// Base directory for resolving relative snippet and media references
    /// (default: `None`, which disables filesystem snippet resolution).
    pub base_path: Option<PathBuf>,

    /// Condition tags to exclude, e.g. `["Default.PrintOnly"]`.
    ///
    /// A node whose `MadCap:conditions` attribute names any of these is
    /// removed entirely. Removals are counted in
    /// [`ConversionMetadata::filtered_conditional_count`](crate::ConversionMetadata).
    pub exclude_conditions: Vec<String>,

    /// Preserve images in the output (default: true).
    pub preserve_images: bool,

    /// Run the post-lint pass over the emitted text (default: true).
    ///
    /// When enabled, collapses redundant blank lines, normalizes spacing
    /// around inline emphasis and fixes terminal punctuation inside list
    /// items. Never alters fenced listing blocks.
    pub post_lint: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            variable_mode: VariableMode::default(),
            base_path: None,
            exclude_conditions: Vec::new(),
            preserve_images: true,
            post_lint: true,
        }
    }
}
