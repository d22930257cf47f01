//! Target materialization.
//! Builds the complete output tree for one target or project type by running
//! the copy engine once per copy instruction, in manifest order.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::copier::{is_container, CopyAction, CopyEngine, CopyRecord};
use crate::error::{Error, Result};
use crate::ignore::ExclusionFilter;
use crate::manifest::{CopyInstruction, PromptsConfig};
use crate::renderer::TemplateRenderer;
use crate::tokens::{resolve_tokens, ProjectMetadata, TokenMap};

/// Result of materializing one target or project type.
#[derive(Debug, Clone)]
pub struct Materialization {
    pub name: String,
    pub output_root: PathBuf,
    pub records: Vec<CopyRecord>,
}

impl Materialization {
    /// Number of files written (rendered or copied).
    pub fn written(&self) -> usize {
        self.records.iter().filter(|r| r.action != CopyAction::Skipped).count()
    }

    pub fn skipped(&self) -> usize {
        self.records.len() - self.written()
    }
}

pub struct Materializer<'a> {
    ctx: &'a Context,
    renderer: &'a dyn TemplateRenderer,
    metadata: Option<&'a ProjectMetadata>,
}

impl<'a> Materializer<'a> {
    /// Materializer for a provisioning run with command-line project metadata.
    /// Metadata tokens missing from the manifest get default values.
    pub fn new(
        ctx: &'a Context,
        renderer: &'a dyn TemplateRenderer,
        metadata: &'a ProjectMetadata,
    ) -> Self {
        Self { ctx, renderer, metadata: Some(metadata) }
    }

    /// Materializer that renders with manifest tokens only. Placeholders the
    /// manifest does not define are left in the output.
    pub fn without_metadata(ctx: &'a Context, renderer: &'a dyn TemplateRenderer) -> Self {
        Self { ctx, renderer, metadata: None }
    }

    /// Token map a target renders with.
    pub fn target_tokens(&self, target: &str) -> Result<TokenMap> {
        let config = self.ctx.manifest().target(target)?;
        let global = &self.ctx.manifest().template_vars;
        Ok(resolve_tokens(global, &config.template_vars, self.metadata))
    }

    /// Global exclusions followed by the target's own.
    pub fn target_exclusions(&self, target: &str) -> Result<ExclusionFilter> {
        let manifest = self.ctx.manifest();
        let config = manifest.target(target)?;
        ExclusionFilter::new(manifest.exclude.iter().chain(config.exclude.iter()))
    }

    /// Materializes `target` beneath `output_root`.
    ///
    /// # Errors
    /// * `Error::UnknownTarget` if the manifest has no such target
    /// * `Error::SourceNotFound` if a copy instruction's source is missing;
    ///   nothing is written in that case
    ///
    /// Directory destinations and the prompts directory are replaced rather
    /// than merged, so a rerun matches a fresh run.
    pub fn materialize_target<P: AsRef<Path>>(
        &self,
        target: &str,
        output_root: P,
    ) -> Result<Materialization> {
        let output_root = output_root.as_ref();
        let config = self.ctx.manifest().target(target)?;
        let tokens = self.target_tokens(target)?;
        let filter = self.target_exclusions(target)?;

        self.check_sources(&config.copies)?;
        if let Some(prompts) = &config.prompts {
            let destination = output_root.join(&prompts.to);
            let library = self.prompt_source();
            self.remove_stale_directory(&destination, output_root, library.as_deref())?;
        }

        let mut records = self.apply_copies(&config.copies, &tokens, &filter, output_root)?;
        if let Some(prompts) = &config.prompts {
            records.extend(self.install_prompts(prompts, &tokens, &filter, output_root)?);
        }

        debug!("Materialized target '{target}' into {}", output_root.display());
        Ok(Materialization {
            name: target.to_string(),
            output_root: output_root.to_path_buf(),
            records,
        })
    }

    /// Materializes a project scaffold beneath `output_root`. Project types use
    /// the global tokens and exclusions only.
    pub fn materialize_project_type<P: AsRef<Path>>(
        &self,
        project_type: &str,
        output_root: P,
    ) -> Result<Materialization> {
        let output_root = output_root.as_ref();
        let manifest = self.ctx.manifest();
        let project = manifest.project_type(project_type)?;
        let tokens = resolve_tokens(&manifest.template_vars, &TokenMap::new(), self.metadata);
        let filter = ExclusionFilter::new(&manifest.exclude)?;

        self.check_sources(&project.files)?;
        let records = self.apply_copies(&project.files, &tokens, &filter, output_root)?;

        Ok(Materialization {
            name: project_type.to_string(),
            output_root: output_root.to_path_buf(),
            records,
        })
    }

    /// Every source must exist before the first write.
    fn check_sources(&self, copies: &[CopyInstruction]) -> Result<()> {
        for copy in copies {
            let source = self.ctx.resolve(&copy.from);
            if !source.exists() {
                return Err(Error::SourceNotFound { source_path: source.display().to_string() });
            }
        }
        Ok(())
    }

    fn apply_copies(
        &self,
        copies: &[CopyInstruction],
        tokens: &TokenMap,
        filter: &ExclusionFilter,
        output_root: &Path,
    ) -> Result<Vec<CopyRecord>> {
        let engine = CopyEngine::new(self.renderer, tokens, filter, self.ctx.root());
        let mut records = Vec::new();
        for copy in copies {
            let source = self.ctx.resolve(&copy.from);
            let destination = output_root.join(&copy.to);
            if source.is_dir() {
                self.remove_stale_directory(&destination, output_root, Some(&source))?;
            }
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            records.extend(engine.copy(&source, &destination)?);
        }
        Ok(records)
    }

    /// Removes a directory left by an earlier run. Directories containing the
    /// output root, the repository root or `source` are kept and merged into.
    fn remove_stale_directory(
        &self,
        directory: &Path,
        output_root: &Path,
        source: Option<&Path>,
    ) -> Result<()> {
        if !directory.is_dir() {
            return Ok(());
        }
        let protected = [Some(output_root), Some(self.ctx.root()), source];
        if protected.into_iter().flatten().any(|path| is_within(path, directory)) {
            debug!("Merging into {}", directory.display());
            return Ok(());
        }
        fs::remove_dir_all(directory)?;
        debug!("Removed previous {}", directory.display());
        Ok(())
    }

    /// First configured prompt library that exists and has any entries.
    fn prompt_source(&self) -> Option<PathBuf> {
        self.ctx
            .manifest()
            .prompt_sources
            .iter()
            .map(|source| self.ctx.resolve(source))
            .find(|source| {
                fs::read_dir(source).map(|mut entries| entries.next().is_some()).unwrap_or(false)
            })
    }

    fn install_prompts(
        &self,
        prompts: &PromptsConfig,
        tokens: &TokenMap,
        filter: &ExclusionFilter,
        output_root: &Path,
    ) -> Result<Vec<CopyRecord>> {
        let Some(source) = self.prompt_source() else {
            let tried: Vec<_> =
                self.ctx.manifest().prompt_sources.iter().map(|s| s.display()).collect();
            warn!("No prompts found in {tried:?}");
            return Ok(Vec::new());
        };

        let destination = output_root.join(&prompts.to);
        fs::create_dir_all(&destination)?;
        let engine = CopyEngine::new(self.renderer, tokens, filter, self.ctx.root());

        let mut entries = fs::read_dir(&source)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut records = Vec::new();
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let target_name = match &prompts.strip_suffix {
                Some(suffix) if name.len() > suffix.len() && name.ends_with(suffix.as_str()) => {
                    name[..name.len() - suffix.len()].to_string()
                }
                _ => name,
            };
            records.extend(engine.copy(entry.path(), destination.join(target_name))?);
        }

        debug!("Installed prompts from {} into {}", source.display(), destination.display());
        Ok(records)
    }
}

/// Removes everything a target's copy instructions and prompt installation
/// would have written under the repository root. Returns the removed paths.
pub fn clean_target(ctx: &Context, target: &str) -> Result<Vec<PathBuf>> {
    let config = ctx.manifest().target(target)?;

    let mut candidates = Vec::new();
    for copy in &config.copies {
        let source = ctx.resolve(&copy.from);
        let mut path = ctx.resolve(&copy.to);
        // A single file copied into a directory landed under its own name.
        if source.is_file() && is_container(&path) {
            if let Some(name) = source.file_name() {
                path = path.join(name);
            }
        }
        candidates.push(path);
    }
    if let Some(prompts) = &config.prompts {
        candidates.push(ctx.resolve(&prompts.to));
    }

    let mut removed = Vec::new();
    for path in candidates {
        if is_same_path(&path, ctx.root()) {
            warn!("Refusing to remove the repository root {}", path.display());
            continue;
        }
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else if path.exists() {
            fs::remove_file(&path)?;
        } else {
            continue;
        }
        debug!("Removed {}", path.display());
        removed.push(path);
    }

    Ok(removed)
}

/// Returns true if `path` is `ancestor` or lies beneath it.
fn is_within(path: &Path, ancestor: &Path) -> bool {
    match (path.canonicalize(), ancestor.canonicalize()) {
        (Ok(path), Ok(ancestor)) => path.starts_with(ancestor),
        _ => false,
    }
}

fn is_same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
