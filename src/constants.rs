//! Common constants used throughout the provisioning tool.

/// Default manifest file name, resolved against the repository root
pub const MANIFEST_FILE: &str = "map.yaml";

/// External resources manifest file name, resolved against the repository root
pub const EXTERNAL_RESOURCES_FILE: &str = "external-resources.map.yaml";

/// Directory under the repository root holding cloned external repositories
pub const EXTERNAL_CACHE_DIR: &str = ".external_repo_cache";

/// Directory under the repository root holding per-target branch worktrees
pub const WORKTREES_DIR: &str = ".template-worktrees";

/// Prefix of the branch each target is published to
pub const BRANCH_PREFIX: &str = "template-";

/// Prompt library locations tried in order when a manifest does not name any
pub const DEFAULT_PROMPT_SOURCES: [&str; 2] = ["common/prompts", "docs/prompts"];

/// Number of leading bytes inspected when probing a file for UTF-8
pub const TEXT_PROBE_LEN: usize = 8192;
