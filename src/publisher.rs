//! Publishing materialized targets to per-target branches.
//!
//! Each target is committed to its own branch (`template-<target>`) through an
//! isolated working tree. Publishing runs four steps:
//! 1. prepare: bind a working tree to the branch and clear it
//! 2. populate: copy the materialized output tree in
//! 3. stage and diff: stage everything; an empty status ends as a no-op
//! 4. commit
//!
//! Failures are not rolled back; the working tree is left for inspection.

use git2::{
    BranchType, ErrorCode, IndexAddOption, Repository, Signature, StatusOptions,
    WorktreeAddOptions,
};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::BRANCH_PREFIX;
use crate::context::Context;
use crate::copier::mirror_tree;
use crate::error::{Error, Result};
use crate::materializer::{Materialization, Materializer};
use crate::renderer::TemplateRenderer;

/// Name of the branch a target is published to.
pub fn branch_name(target: &str) -> String {
    format!("{BRANCH_PREFIX}{target}")
}

/// Commit message used when publishing a target.
pub fn commit_message(branch: &str) -> String {
    format!("Update {branch} from provisioning manifest")
}

/// Version control operations needed to publish a target.
pub trait BranchBackend {
    /// Returns a working directory bound to `branch`, creating the branch from
    /// the current history if it does not exist yet.
    fn prepare_branch(&mut self, branch: &str) -> Result<PathBuf>;

    /// Removes everything in the working directory except version control
    /// metadata.
    fn clear_working_tree(&mut self, workdir: &Path) -> Result<()> {
        for entry in fs::read_dir(workdir)? {
            let entry = entry?;
            if entry.file_name() == ".git" {
                continue;
            }
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Stages additions, modifications and deletions.
    fn stage_all(&mut self) -> Result<()>;

    /// Returns true if the staged state differs from the branch head.
    fn has_changes(&mut self) -> Result<bool>;

    /// Commits staged changes and returns the new commit id.
    fn commit(&mut self, message: &str) -> Result<String>;
}

/// Outcome of publishing a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Committed { branch: String, commit: String },
    NoChanges { branch: String },
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Committed { branch, commit } => {
                write!(f, "committed {} to '{branch}'", &commit[..commit.len().min(7)])
            }
            PublishOutcome::NoChanges { branch } => write!(f, "no changes for '{branch}'"),
        }
    }
}

pub struct Publisher<B: BranchBackend> {
    backend: B,
}

impl<B: BranchBackend> Publisher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Publishes the materialized `output_tree` of `target` to its branch.
    pub fn publish<P: AsRef<Path>>(
        &mut self,
        target: &str,
        output_tree: P,
    ) -> Result<PublishOutcome> {
        let branch = branch_name(target);

        let workdir = self.backend.prepare_branch(&branch)?;
        self.backend.clear_working_tree(&workdir)?;
        debug!("Prepared {} for '{branch}'", workdir.display());

        let files = mirror_tree(output_tree.as_ref(), &workdir)?;
        debug!("Populated {files} files into {}", workdir.display());

        self.backend.stage_all()?;
        if !self.backend.has_changes()? {
            info!("No changes to publish for '{branch}'");
            return Ok(PublishOutcome::NoChanges { branch });
        }

        let commit = self.backend.commit(&commit_message(&branch))?;
        info!("Committed {commit} to '{branch}'");
        Ok(PublishOutcome::Committed { branch, commit })
    }

    /// Materializes each target into a scratch directory and publishes it,
    /// calling `on_published` after every target. All targets are validated
    /// before the first one is published; the first failure stops the run.
    ///
    /// Only manifest tokens are rendered, so placeholders filled in at
    /// provisioning time stay in the branch.
    pub fn publish_targets<F>(
        &mut self,
        ctx: &Context,
        renderer: &dyn TemplateRenderer,
        targets: &[String],
        mut on_published: F,
    ) -> Result<Vec<PublishOutcome>>
    where
        F: FnMut(&Materialization, &PublishOutcome),
    {
        for target in targets {
            ctx.manifest().target(target)?;
        }

        let materializer = Materializer::without_metadata(ctx, renderer);
        let mut outcomes = Vec::new();
        for target in targets {
            let output = tempfile::tempdir()?;
            let materialization = materializer.materialize_target(target, output.path())?;
            let outcome = self.publish(target, output.path())?;
            on_published(&materialization, &outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// [`BranchBackend`] backed by git worktrees.
///
/// Worktrees live under `worktrees_dir/<branch>` and are reused across runs.
pub struct GitBackend {
    repo: Repository,
    worktrees_dir: PathBuf,
    current: Option<Repository>,
}

impl GitBackend {
    /// Opens the repository containing `repo_path`.
    pub fn open<P: AsRef<Path>, W: AsRef<Path>>(repo_path: P, worktrees_dir: W) -> Result<Self> {
        let repo = Repository::discover(repo_path.as_ref())?;
        Ok(Self { repo, worktrees_dir: worktrees_dir.as_ref().to_path_buf(), current: None })
    }

    fn current(&self) -> Result<&Repository> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::ConfigError("no branch has been prepared".to_string()))
    }

    fn ensure_branch<'r>(repo: &'r Repository, branch: &str) -> Result<git2::Reference<'r>> {
        match repo.find_branch(branch, BranchType::Local) {
            Ok(existing) => Ok(existing.into_reference()),
            Err(e) if e.code() == ErrorCode::NotFound => {
                let head = repo.head()?.peel_to_commit()?;
                debug!("Creating branch '{branch}' from {}", head.id());
                Ok(repo.branch(branch, &head, false)?.into_reference())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        match repo.signature() {
            Ok(signature) => Ok(signature.to_owned()),
            Err(_) => Ok(Signature::now("provision", "provision@localhost")?),
        }
    }
}

impl BranchBackend for GitBackend {
    fn prepare_branch(&mut self, branch: &str) -> Result<PathBuf> {
        let path = self.worktrees_dir.join(branch);

        if path.join(".git").exists() {
            let worktree = Repository::open(&path)?;
            self.current = Some(worktree);
            return Ok(path);
        }

        // A registration whose directory is gone blocks re-adding the worktree.
        if let Ok(stale) = self.repo.find_worktree(branch) {
            if stale.validate().is_err() {
                stale.prune(None)?;
            }
        }
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&self.worktrees_dir)?;

        let reference = Self::ensure_branch(&self.repo, branch)?;
        let mut options = WorktreeAddOptions::new();
        options.reference(Some(&reference));
        let worktree = self.repo.worktree(branch, &path, Some(&options))?;
        debug!("Added worktree for '{branch}' at {}", path.display());

        self.current = Some(Repository::open_from_worktree(&worktree)?);
        Ok(path)
    }

    fn stage_all(&mut self) -> Result<()> {
        let repo = self.current()?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn has_changes(&mut self) -> Result<bool> {
        let repo = self.current()?;
        let mut options = StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let statuses = repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn commit(&mut self, message: &str) -> Result<String> {
        let repo = self.current()?;
        let mut index = repo.index()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let signature = Self::signature(repo)?;
        let parent = repo.head()?.peel_to_commit()?;

        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        Ok(oid.to_string())
    }
}
