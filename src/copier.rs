//! The copy-and-render engine.
//! Reproduces a source file or directory at a destination, rendering tokens in
//! text files and copying everything else byte-for-byte.

use filetime::FileTime;
use log::debug;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use walkdir::WalkDir;

use crate::classify::{read_file_content, FileContent};
use crate::error::{Error, Result};
use crate::ignore::{relative_path_string, ExclusionFilter};
use crate::renderer::TemplateRenderer;
use crate::tokens::TokenMap;

/// What happened to a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    /// Text file rendered with tokens
    Rendered,
    /// Binary file copied as is
    Copied,
    /// Matched an exclusion pattern
    Skipped,
}

impl fmt::Display for CopyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyAction::Rendered => write!(f, "Processed"),
            CopyAction::Copied => write!(f, "Copied"),
            CopyAction::Skipped => write!(f, "Skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRecord {
    pub source: PathBuf,
    /// Destination path; for skipped files, where it would have been written
    pub target: PathBuf,
    pub action: CopyAction,
}

/// Copies sources into destinations with token rendering and exclusions.
pub struct CopyEngine<'a> {
    renderer: &'a dyn TemplateRenderer,
    tokens: &'a TokenMap,
    filter: &'a ExclusionFilter,
    /// Single-file sources are matched against paths relative to this root.
    base_root: PathBuf,
}

impl<'a> CopyEngine<'a> {
    pub fn new<P: AsRef<Path>>(
        renderer: &'a dyn TemplateRenderer,
        tokens: &'a TokenMap,
        filter: &'a ExclusionFilter,
        base_root: P,
    ) -> Self {
        Self { renderer, tokens, filter, base_root: base_root.as_ref().to_path_buf() }
    }

    /// Copies `source` (a file or a directory) to `destination`.
    ///
    /// If the source is a directory, or the destination is an existing
    /// directory or ends with a path separator, the destination is treated as
    /// a container. Otherwise it is the exact output file path.
    ///
    /// # Errors
    /// * `Error::SourceNotFound` if `source` does not exist
    pub fn copy<S: AsRef<Path>, D: AsRef<Path>>(
        &self,
        source: S,
        destination: D,
    ) -> Result<Vec<CopyRecord>> {
        let source = source.as_ref();
        let destination = destination.as_ref();

        if source.is_dir() {
            self.copy_dir(source, destination)
        } else if source.is_file() {
            let target = match source.file_name() {
                Some(name) if is_container(destination) => {
                    fs::create_dir_all(destination)?;
                    destination.join(name)
                }
                _ => destination.to_path_buf(),
            };
            let relative = self.relative_to_root(source, None);
            Ok(vec![self.copy_file(source, &target, &relative)?])
        } else {
            Err(Error::SourceNotFound { source_path: source.display().to_string() })
        }
    }

    fn copy_dir(&self, source: &Path, destination: &Path) -> Result<Vec<CopyRecord>> {
        let mut records = Vec::new();
        fs::create_dir_all(destination)?;

        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let subtree_path = path.strip_prefix(source).unwrap_or(path);
            let target = destination.join(subtree_path);
            let relative = self.relative_to_root(path, Some(source));
            records.push(self.copy_file(path, &target, &relative)?);
        }

        debug!("Copied directory {} -> {}", source.display(), destination.display());
        Ok(records)
    }

    /// Path used for exclusion matching: relative to the directory being
    /// copied, or for single files relative to the base root. Files outside
    /// the base root fall back to their file name.
    fn relative_to_root(&self, path: &Path, copy_root: Option<&Path>) -> String {
        let relative = match copy_root {
            Some(root) => path.strip_prefix(root),
            None => path.strip_prefix(&self.base_root),
        };
        match relative {
            Ok(relative) => relative_path_string(relative),
            Err(_) => path.file_name().map(relative_path_string).unwrap_or_default(),
        }
    }

    fn copy_file(&self, source: &Path, target: &Path, relative: &str) -> Result<CopyRecord> {
        if self.filter.is_excluded(relative) {
            return Ok(CopyRecord {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
                action: CopyAction::Skipped,
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let action = match read_file_content(source)? {
            FileContent::Text(content) => {
                let rendered = self.renderer.render(&content, self.tokens);
                fs::write(target, rendered)?;
                debug!("Rendered {} -> {}", source.display(), target.display());
                CopyAction::Rendered
            }
            FileContent::Binary => {
                copy_preserving_metadata(source, target)?;
                debug!("Copied {} -> {}", source.display(), target.display());
                CopyAction::Copied
            }
        };

        Ok(CopyRecord { source: source.to_path_buf(), target: target.to_path_buf(), action })
    }
}

/// Returns true if a single file copied to `path` lands inside it: `path` is
/// an existing directory or is written with a trailing separator.
pub fn is_container(path: &Path) -> bool {
    path.is_dir() || path.as_os_str().to_string_lossy().ends_with(['/', MAIN_SEPARATOR])
}

/// Copies a file byte-for-byte, keeping its permissions and timestamps.
pub fn copy_preserving_metadata(source: &Path, target: &Path) -> Result<()> {
    // fs::copy carries the permission bits over.
    fs::copy(source, target)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        target,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(())
}

/// Copies an already rendered tree verbatim, creating directories as needed.
/// Returns the number of files written.
pub fn mirror_tree<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Result<usize> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    if !source.exists() {
        return Err(Error::SourceNotFound { source_path: source.display().to_string() });
    }

    let mut files = 0;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_preserving_metadata(entry.path(), &target)?;
            files += 1;
        }
    }
    fs::create_dir_all(destination)?;

    Ok(files)
}
