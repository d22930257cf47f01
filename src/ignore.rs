//! Exclusion pattern handling.
//! Source files whose path relative to the copy root matches any configured
//! glob are skipped entirely, similar to .gitignore functionality.

use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::{Component, Path};

/// Compiled, ordered set of exclusion globs.
///
/// Patterns use shell semantics (`*`, `?`, `[...]`) and are matched against
/// the full relative path, so `*` also crosses `/`.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<String>,
    glob_set: GlobSet,
}

impl ExclusionFilter {
    /// Compiles the patterns into a filter.
    ///
    /// # Errors
    /// * `Error::GlobError` if any pattern is not a valid glob
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder.add(Glob::new(pattern)?);
            kept.push(pattern.to_string());
        }
        let glob_set = builder.build()?;

        Ok(Self { patterns: kept, glob_set })
    }

    /// Filter that excludes nothing.
    pub fn empty() -> Self {
        Self { patterns: Vec::new(), glob_set: GlobSet::empty() }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the forward-slash relative path matches any pattern.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        let excluded = self.glob_set.is_match(relative_path);
        if excluded {
            debug!("Skipping '{relative_path}': matches an exclusion pattern");
        }
        excluded
    }
}

/// Renders a relative path with `/` separators regardless of the host.
pub fn relative_path_string<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
