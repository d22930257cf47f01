//! Text/binary classification of template files.
//!
//! A file is treated as text when its extension (or well-known file name) is on
//! the allow-list, or otherwise when its first [`TEXT_PROBE_LEN`] bytes decode as
//! UTF-8. This is a heuristic: binary content that happens to be valid UTF-8 in
//! that window is treated as text, and non-UTF-8 text is treated as binary.

use crate::constants::TEXT_PROBE_LEN;
use crate::error::Result;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Extensions rendered without probing the content.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "mdx", "markdown", "rst", "adoc", "prompt", "puml", "yaml", "yml", "json",
    "jsonc", "toml", "xml", "html", "htm", "css", "scss", "js", "mjs", "cjs", "ts", "jsx",
    "tsx", "vue", "svelte", "py", "rs", "java", "kt", "go", "rb", "php", "cs", "sh", "bash",
    "zsh", "fish", "ps1", "bat", "cmd", "sql", "graphql", "cfg", "conf", "ini", "env",
    "properties", "gradle", "csv", "svg", "tmpl", "template", "j2", "mdc",
];

/// File names without a useful extension that are always text.
const TEXT_FILE_NAMES: &[&str] = &[
    "dockerfile",
    "makefile",
    "procfile",
    "license",
    "readme",
    ".gitignore",
    ".dockerignore",
    ".editorconfig",
    ".gitattributes",
    ".env",
];

/// Content of a template file after the text/binary decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 content that goes through token rendering
    Text(String),
    /// Anything else; copied byte-for-byte
    Binary,
}

fn has_text_extension(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }

    path.file_name()
        .map(|name| TEXT_FILE_NAMES.contains(&name.to_string_lossy().to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Returns true if the leading bytes of a file look like UTF-8 text.
///
/// A multi-byte sequence cut off by the end of the probe window still counts as
/// valid, since the rest of it lies beyond the bytes we read.
pub fn probe_utf8(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

fn probe_file(path: &Path) -> std::io::Result<bool> {
    let mut buffer = Vec::with_capacity(TEXT_PROBE_LEN);
    File::open(path)?.take(TEXT_PROBE_LEN as u64).read_to_end(&mut buffer)?;
    Ok(probe_utf8(&buffer))
}

/// Decides whether a file should be rendered as text.
///
/// Unreadable files are reported as binary so that the subsequent copy surfaces
/// the real I/O error.
pub fn is_text_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    has_text_extension(path) || probe_file(path).unwrap_or(false)
}

/// Reads a file, falling back to [`FileContent::Binary`] when it is classified as
/// binary or when its full contents turn out not to be UTF-8.
pub fn read_file_content<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    if !is_text_file(path) {
        return Ok(FileContent::Binary);
    }

    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => FileContent::Text(text),
        Err(_) => {
            log::debug!("'{}' is not valid UTF-8, copying as binary", path.display());
            FileContent::Binary
        }
    })
}
