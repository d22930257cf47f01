//! Template provisioning for AI-tool configurations and project scaffolds.
//! Materializes files described by a manifest into destination trees, rendering
//! `{{TOKEN}}` placeholders, and optionally commits each target to its own
//! branch.

/// Text/binary classification of template files
pub mod classify;

/// Command-line interface module
pub mod cli;

/// Common constants
pub mod constants;

/// Explicit run context: repository root and loaded manifest
pub mod context;

/// The copy-and-render engine
pub mod copier;

/// Error types and handling
pub mod error;

/// Cloning external repositories and copying selected folders
pub mod external;

/// Exclusion patterns
pub mod ignore;

/// Manifest loading and validation
/// Supports map.yaml and external-resources.map.yaml
pub mod manifest;

/// Building output trees for targets and project types
pub mod materializer;

/// Committing materialized targets to per-target branches
pub mod publisher;

/// `{{TOKEN}}` substitution
pub mod renderer;

/// Token maps, layering and project metadata
pub mod tokens;
