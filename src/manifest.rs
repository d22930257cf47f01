//! Manifest loading and validation.
//! This module parses `map.yaml` into typed records and rejects malformed
//! manifests before anything on disk is touched.

use crate::constants::DEFAULT_PROMPT_SOURCES;
use crate::error::{Error, Result};
use crate::ignore::ExclusionFilter;
use crate::tokens::{deserialize_tokens, is_valid_token_name, TokenMap};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One unit of file or directory materialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyInstruction {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Where a target installs the shared prompt library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptsConfig {
    /// Destination directory, relative to the output root
    pub to: PathBuf,
    /// Suffix removed from prompt file names, e.g. `.prompt`
    #[serde(default)]
    pub strip_suffix: Option<String>,
}

/// Configuration of a single named target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub template_vars: TokenMap,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub copies: Vec<CopyInstruction>,
    #[serde(default)]
    pub prompts: Option<PromptsConfig>,
}

/// A project scaffold.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectType {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<CopyInstruction>,
}

fn default_prompt_sources() -> Vec<PathBuf> {
    DEFAULT_PROMPT_SOURCES.iter().map(PathBuf::from).collect()
}

/// The whole provisioning manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub template_vars: TokenMap,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub targets: IndexMap<String, TargetConfig>,
    #[serde(default)]
    pub project_types: IndexMap<String, ProjectType>,
    #[serde(default = "default_prompt_sources")]
    pub prompt_sources: Vec<PathBuf>,
}

impl Manifest {
    pub fn target(&self, name: &str) -> Result<&TargetConfig> {
        self.targets
            .get(name)
            .ok_or_else(|| Error::UnknownTarget { target: name.to_string() })
    }

    pub fn project_type(&self, name: &str) -> Result<&ProjectType> {
        self.project_types
            .get(name)
            .ok_or_else(|| Error::UnknownProjectType { project_type: name.to_string() })
    }

    fn validate(&self) -> Result<()> {
        validate_tokens("template_vars", &self.template_vars)?;
        validate_patterns("exclude", &self.exclude)?;

        for (name, target) in &self.targets {
            let section = format!("targets.{name}");
            validate_tokens(&format!("{section}.template_vars"), &target.template_vars)?;
            validate_patterns(&format!("{section}.exclude"), &target.exclude)?;
            validate_copies(&format!("{section}.copies"), &target.copies)?;
            if let Some(prompts) = &target.prompts {
                if prompts.to.as_os_str().is_empty() {
                    return Err(Error::ConfigError(format!(
                        "'{section}.prompts.to' must not be empty"
                    )));
                }
            }
        }

        for (name, project) in &self.project_types {
            validate_copies(&format!("project_types.{name}.files"), &project.files)?;
        }

        Ok(())
    }
}

fn validate_tokens(section: &str, tokens: &TokenMap) -> Result<()> {
    match tokens.keys().find(|key| !is_valid_token_name(key)) {
        Some(key) => Err(Error::ConfigError(format!(
            "invalid token name '{key}' in '{section}' (expected [A-Z0-9_]+)"
        ))),
        None => Ok(()),
    }
}

fn validate_patterns(section: &str, patterns: &[String]) -> Result<()> {
    ExclusionFilter::new(patterns)
        .map(|_| ())
        .map_err(|e| Error::ConfigError(format!("invalid pattern in '{section}': {e}")))
}

fn validate_copies(section: &str, copies: &[CopyInstruction]) -> Result<()> {
    if copies.is_empty() {
        return Err(Error::ConfigError(format!(
            "'{section}' must list at least one copy instruction"
        )));
    }
    for (index, copy) in copies.iter().enumerate() {
        if copy.from.as_os_str().is_empty() || copy.to.as_os_str().is_empty() {
            return Err(Error::ConfigError(format!(
                "'{section}[{index}]' needs non-empty 'from' and 'to'"
            )));
        }
    }
    Ok(())
}

/// Parses and validates manifest content.
///
/// # Errors
/// * `Error::ConfigError` if `targets` is missing, is not a mapping, is empty,
///   or any section fails validation
/// * `Error::YamlError` if the document is not valid YAML
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;

    let root = document
        .as_mapping()
        .ok_or_else(|| Error::ConfigError("manifest must be a mapping".to_string()))?;
    match root.get("targets") {
        None => {
            return Err(Error::ConfigError("manifest is missing the 'targets' section".into()))
        }
        Some(targets) => match targets.as_mapping() {
            Some(targets) if !targets.is_empty() => {}
            Some(_) => return Err(Error::ConfigError("'targets' must not be empty".into())),
            None => return Err(Error::ConfigError("'targets' must be a mapping".into())),
        },
    }

    let manifest: Manifest = serde_yaml::from_value(document)
        .map_err(|e| Error::ConfigError(format!("invalid manifest: {e}")))?;
    manifest.validate()?;

    Ok(manifest)
}

/// Reads and parses the manifest at `path`.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::ConfigError(format!(
            "manifest not found: {}",
            path.display()
        )));
    }

    debug!("Loading manifest from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

/// A third-party repository whose folders can be pulled into a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalRepo {
    pub url: String,
    pub subfolder: PathBuf,
    #[serde(default)]
    pub folders: Vec<PathBuf>,
}

/// Contents of `external-resources.map.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalResources {
    #[serde(default)]
    pub repos: IndexMap<String, ExternalRepo>,
}

impl ExternalResources {
    pub fn repo(&self, key: &str) -> Result<&ExternalRepo> {
        self.repos
            .get(key)
            .ok_or_else(|| Error::UnknownRepository { key: key.to_string() })
    }
}

/// Parses and validates an external resources document.
pub fn parse_external_resources(content: &str) -> Result<ExternalResources> {
    let resources: ExternalResources = serde_yaml::from_str(content)
        .map_err(|e| Error::ConfigError(format!("invalid external resources map: {e}")))?;

    for (key, repo) in &resources.repos {
        if repo.url.trim().is_empty() {
            return Err(Error::ConfigError(format!("repo '{key}' has an empty 'url'")));
        }
        if repo.folders.is_empty() {
            return Err(Error::ConfigError(format!("repo '{key}' lists no 'folders'")));
        }
    }

    Ok(resources)
}

/// Reads and parses the external resources map at `path`.
pub fn load_external_resources<P: AsRef<Path>>(path: P) -> Result<ExternalResources> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::ConfigError(format!(
            "missing external resources map: {}",
            path.display()
        )));
    }

    debug!("Loading external resources from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_external_resources(&content)
}
