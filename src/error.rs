//! Error handling for the provisioning tool.
//! Defines the error type and result alias used throughout the crate.

use thiserror::Error;

/// Errors that can occur while loading manifests, materializing targets
/// or publishing them to branches.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    /// Represents errors in the shape or content of a manifest
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents errors that occur while parsing YAML documents
    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    /// Represents invalid exclusion patterns
    #[error("Glob pattern error: {0}.")]
    GlobError(#[from] globset::Error),

    /// Represents failures of version control operations
    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    /// Represents failures while walking a source tree
    #[error("Directory traversal error: {0}.")]
    WalkError(#[from] walkdir::Error),

    #[error("Unknown target: '{target}'. Run 'provision list' to see available targets.")]
    UnknownTarget { target: String },

    #[error("Unknown project type: '{project_type}'.")]
    UnknownProjectType { project_type: String },

    #[error("Unknown repository key: '{key}'.")]
    UnknownRepository { key: String },

    /// A copy instruction references a path that does not exist.
    #[error("Source not found: '{source_path}'.")]
    SourceNotFound { source_path: String },

    /// Represents invalid combinations of command-line arguments
    #[error("Usage error: {0}.")]
    UsageError(String),
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
