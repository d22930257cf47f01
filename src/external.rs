//! Pulling resources from external git repositories.
//! Repositories are cloned into a local cache (or fast-forwarded if already
//! cached) and selected folders are copied into a client project.
//!
//! The cache is not locked: concurrent pulls of the same key must not run.

use git2::{build::RepoBuilder, Cred, FetchOptions, RemoteCallbacks, Repository};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{EXTERNAL_CACHE_DIR, EXTERNAL_RESOURCES_FILE};
use crate::copier::mirror_tree;
use crate::error::Result;
use crate::manifest::load_external_resources;

/// Result of pulling one repository.
#[derive(Debug, Clone, Default)]
pub struct PullReport {
    /// Directory the folders were copied under (`target_dir/subfolder`)
    pub target_base: PathBuf,
    /// `(source, destination)` of each copied folder
    pub copied: Vec<(PathBuf, PathBuf)>,
    /// Configured folders that do not exist in the repository
    pub missing: Vec<PathBuf>,
}

fn fetch_options<'cb>() -> FetchOptions<'cb> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, _allowed_types| {
        Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
    });

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);
    fetch_opts
}

fn clone_repo(url: &str, path: &Path) -> Result<Repository> {
    debug!("Cloning '{url}' to '{}'.", path.display());
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());
    Ok(builder.clone(url, path)?)
}

/// Fetches `origin` and moves the checked-out branch to the fetched head,
/// discarding local changes in the cache.
fn update_repo(path: &Path) -> Result<Repository> {
    debug!("Updating cached repository '{}'.", path.display());
    let repo = Repository::open(path)?;
    {
        let mut remote = repo.find_remote("origin")?;
        let empty: [&str; 0] = [];
        remote.fetch(&empty, Some(&mut fetch_options()), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let target = repo.find_object(commit.id(), None)?;

        repo.checkout_tree(&target, Some(git2::build::CheckoutBuilder::new().force()))?;
        let mut head = repo.head()?;
        if head.is_branch() {
            head.set_target(commit.id(), "provision: fast-forward cached repository")?;
        } else {
            repo.set_head_detached(commit.id())?;
        }
    }
    Ok(repo)
}

/// Clones or updates `url` at `path`.
pub fn sync_repo(url: &str, path: &Path) -> Result<Repository> {
    if path.join(".git").exists() {
        update_repo(path)
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        clone_repo(url, path)
    }
}

/// Copies the folders configured for `key` in `<root>/external-resources.map.yaml`
/// into `target_dir/subfolder`, using `<root>/.external_repo_cache` as the cache.
///
/// # Errors
/// * `Error::ConfigError` if the external resources map is missing or invalid
/// * `Error::UnknownRepository` if `key` is not configured
pub fn pull_external_repo<R: AsRef<Path>, P: AsRef<Path>>(
    root: R,
    key: &str,
    target_dir: P,
) -> Result<PullReport> {
    let root = root.as_ref();
    let resources = load_external_resources(root.join(EXTERNAL_RESOURCES_FILE))?;
    let repo_config = resources.repo(key)?;

    let cache_path = root.join(EXTERNAL_CACHE_DIR).join(key);
    sync_repo(&repo_config.url, &cache_path)?;

    let target_base = target_dir.as_ref().join(&repo_config.subfolder);
    let mut report = PullReport { target_base: target_base.clone(), ..Default::default() };

    for folder in &repo_config.folders {
        let source = cache_path.join(folder);
        let destination = target_base.join(folder);
        if !source.is_dir() {
            warn!("'{}' not found in repo '{key}'", folder.display());
            report.missing.push(folder.clone());
            continue;
        }
        if destination.exists() {
            fs::remove_dir_all(&destination)?;
        }
        mirror_tree(&source, &destination)?;
        debug!("Copied {} -> {}", source.display(), destination.display());
        report.copied.push((source, destination));
    }

    Ok(report)
}
