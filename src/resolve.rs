//! Collaborator interfaces for external resources.
//!
//! The core never touches the filesystem directly: snippet bodies, variable
//! values and cross-reference targets arrive through these traits. The
//! provided implementations cover the common case (project files relative to
//! a base path, a flat variable table); batch drivers can substitute their
//! own. All lookups are synchronous and infallible in the `Option` sense —
//! a `None` is degraded to a placeholder plus a warning by the caller, never
//! to a silent success.

use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;

/// Loads the raw markup of a referenced snippet document (`.flsnp`).
///
/// The returned markup is parsed and canonicalized by the core, so the
/// resolver stays a thin I/O wrapper.
pub trait SnippetResolver {
    fn resolve(&self, src: &str) -> Option<String>;
}

/// Resolves a variable name (`Set.Name`) to its literal value.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// A resolved cross-reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefTarget {
    /// Target document path in the output tree, e.g. `Install.adoc`.
    pub path: String,
    /// Fragment within the target, without the leading `#`.
    pub fragment: Option<String>,
    /// Override display text; `None` keeps the source display text.
    pub text: Option<String>,
}

/// Mapping from source anchor to resolved target, built during
/// canonicalization and consumed during emission.
pub type XrefTable = HashMap<String, XrefTarget>;

/// Resolves a source `href` anchor to a target location.
pub trait CrossRefResolver {
    fn resolve(&self, href: &str) -> Option<XrefTarget>;
}

/// Reads snippets from the project tree, relative to a base directory.
pub struct FileSnippetResolver {
    base_path: PathBuf,
}

impl FileSnippetResolver {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl SnippetResolver for FileSnippetResolver {
    fn resolve(&self, src: &str) -> Option<String> {
        // Flare snippet references are relative paths with forward slashes.
        let mut path = self.base_path.clone();
        for part in src.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    path.pop();
                }
                part => path.push(part),
            }
        }
        debug!("resolving snippet {src} -> {}", path.display());
        std::fs::read_to_string(&path).ok()
    }
}

/// A resolver with no project tree behind it; every lookup misses.
pub struct NullSnippetResolver;

impl SnippetResolver for NullSnippetResolver {
    fn resolve(&self, _src: &str) -> Option<String> {
        None
    }
}

/// A flat `name -> value` table, as produced by an external FLVAR parser.
///
/// Lookup falls back to the bare name when the table was keyed without the
/// variable-set prefix.
pub struct MapVariableResolver {
    values: HashMap<String, String>,
}

impl MapVariableResolver {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapVariableResolver {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl VariableResolver for MapVariableResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        let bare = name.rsplit('.').next()?;
        self.values.get(bare).cloned()
    }
}

/// Resolver with an empty variable table.
pub struct NullVariableResolver;

impl VariableResolver for NullVariableResolver {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Rewrites relative `.htm`/`.html` targets to their `.adoc` counterparts and
/// passes absolute URLs through unchanged. Performs no existence check.
pub struct RelativeCrossRefResolver;

impl CrossRefResolver for RelativeCrossRefResolver {
    fn resolve(&self, href: &str) -> Option<XrefTarget> {
        if href.is_empty() {
            return None;
        }
        let (target, fragment) = match href.split_once('#') {
            Some((t, f)) => (t, Some(f.to_string())),
            None => (href, None),
        };
        if target.starts_with("http://") || target.starts_with("https://") {
            return Some(XrefTarget {
                path: target.to_string(),
                fragment,
                text: None,
            });
        }
        let path = target
            .strip_suffix(".htm")
            .or_else(|| target.strip_suffix(".html"))
            .map(|stem| format!("{stem}.adoc"))
            .unwrap_or_else(|| target.to_string());
        Some(XrefTarget {
            path,
            fragment,
            text: None,
        })
    }
}

/// Resolver that treats every cross-reference as unresolved.
pub struct NullCrossRefResolver;

impl CrossRefResolver for NullCrossRefResolver {
    fn resolve(&self, _href: &str) -> Option<XrefTarget> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_xrefs_swap_extension_and_keep_fragment() {
        let target = RelativeCrossRefResolver
            .resolve("../Topics/Install.htm#step-3")
            .unwrap();
        assert_eq!(target.path, "../Topics/Install.adoc");
        assert_eq!(target.fragment.as_deref(), Some("step-3"));
    }

    #[test]
    fn absolute_urls_pass_through() {
        let target = RelativeCrossRefResolver
            .resolve("https://example.com/guide.html")
            .unwrap();
        assert_eq!(target.path, "https://example.com/guide.html");
    }

    #[test]
    fn variable_lookup_falls_back_to_bare_name() {
        let vars = MapVariableResolver::from([("CompanyName", "Acme")]);
        assert_eq!(
            vars.resolve("General.CompanyName").as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn snippet_paths_resolve_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        let snippets = dir.path().join("Resources").join("Snippets");
        std::fs::create_dir_all(&snippets).unwrap();
        std::fs::write(snippets.join("Note.flsnp"), "<html/>").unwrap();

        let resolver = FileSnippetResolver::new(dir.path().join("Content"));
        let body = resolver.resolve("../Resources/Snippets/Note.flsnp");
        assert_eq!(body.as_deref(), Some("<html/>"));
        assert!(resolver.resolve("../Resources/Snippets/Missing.flsnp").is_none());
    }
}
