//! Explicit run context.
//! Every operation receives the repository root and the loaded manifest from
//! here instead of relying on the process working directory.

use crate::constants::{MANIFEST_FILE, WORKTREES_DIR};
use crate::error::Result;
use crate::manifest::{load_manifest, Manifest};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    manifest: Manifest,
}

impl Context {
    pub fn new<P: AsRef<Path>>(root: P, manifest: Manifest) -> Self {
        Self { root: root.as_ref().to_path_buf(), manifest }
    }

    /// Loads the manifest from `manifest_path`, or `<root>/map.yaml` if none is
    /// given. Relative manifest paths are resolved against the root.
    pub fn load<P: AsRef<Path>>(root: P, manifest_path: Option<&Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = match manifest_path {
            Some(path) => root.join(path),
            None => root.join(MANIFEST_FILE),
        };
        let manifest = load_manifest(&manifest_path)?;
        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolves a manifest path against the repository root.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.root.join(path)
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join(WORKTREES_DIR)
    }
}
