use provision::error::Error;
use provision::manifest::{load_manifest, parse_external_resources, parse_manifest};
use std::path::PathBuf;
use tempfile::TempDir;

const MANIFEST: &str = r#"
template_vars:
  PROJECT_NAME: demo
  YEAR: 2024
  PUBLIC: true
exclude:
  - "**/.DS_Store"
targets:
  claude-code:
    template_vars:
      TOOL: claude
    exclude: ["*.draft.md"]
    copies:
      - from: templates/claude/CLAUDE.md
        to: CLAUDE.md
      - from: templates/claude/settings
        to: .claude
    prompts:
      to: .claude/commands
      strip_suffix: .prompt
  copilot:
    copies:
      - from: templates/copilot
        to: .github
project_types:
  mkdocs:
    name: MkDocs
    description: MkDocs documentation site
    files:
      - from: templates/mkdocs
        to: docs
"#;

#[test]
fn test_parse_full_manifest() {
    let manifest = parse_manifest(MANIFEST).unwrap();

    assert_eq!(manifest.template_vars["PROJECT_NAME"], "demo");
    assert_eq!(manifest.template_vars["YEAR"], "2024");
    assert_eq!(manifest.template_vars["PUBLIC"], "true");
    assert_eq!(manifest.exclude, vec!["**/.DS_Store"]);

    let names: Vec<_> = manifest.targets.keys().cloned().collect();
    assert_eq!(names, vec!["claude-code", "copilot"]);

    let claude = manifest.target("claude-code").unwrap();
    assert_eq!(claude.template_vars["TOOL"], "claude");
    assert_eq!(claude.copies.len(), 2);
    assert_eq!(claude.copies[1].to, PathBuf::from(".claude"));
    let prompts = claude.prompts.as_ref().unwrap();
    assert_eq!(prompts.strip_suffix.as_deref(), Some(".prompt"));

    let copilot = manifest.target("copilot").unwrap();
    assert!(copilot.template_vars.is_empty());
    assert!(copilot.prompts.is_none());

    let mkdocs = manifest.project_type("mkdocs").unwrap();
    assert_eq!(mkdocs.name, "MkDocs");
    assert_eq!(mkdocs.files[0].from, PathBuf::from("templates/mkdocs"));

    assert_eq!(
        manifest.prompt_sources,
        vec![PathBuf::from("common/prompts"), PathBuf::from("docs/prompts")]
    );
}

#[test]
fn test_minimal_manifest_defaults() {
    let manifest =
        parse_manifest("targets:\n  t:\n    copies: [{from: a, to: b}]\n").unwrap();
    assert!(manifest.template_vars.is_empty());
    assert!(manifest.exclude.is_empty());
    assert!(manifest.project_types.is_empty());
}

fn assert_config_error(content: &str, fragment: &str) {
    match parse_manifest(content) {
        Err(Error::ConfigError(message)) => {
            assert!(message.contains(fragment), "'{message}' should mention '{fragment}'")
        }
        other => panic!("Expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_targets_section_is_required() {
    assert_config_error("template_vars: {A: b}\n", "missing the 'targets' section");
    assert_config_error("targets: [a, b]\n", "must be a mapping");
    assert_config_error("targets: {}\n", "must not be empty");
}

#[test]
fn test_target_validation() {
    assert_config_error("targets:\n  t:\n    copies: []\n", "at least one copy instruction");
    assert_config_error("targets:\n  t: {}\n", "at least one copy instruction");
    assert_config_error("targets:\n  t:\n    copies: [{from: '', to: b}]\n", "non-empty");
    assert_config_error("targets:\n  t:\n    copies: [{to: b}]\n", "invalid manifest");
    assert_config_error(
        "targets:\n  t:\n    template_vars: {lower: x}\n    copies: [{from: a, to: b}]\n",
        "invalid token name 'lower'",
    );
    assert_config_error(
        "exclude: ['[oops']\ntargets:\n  t:\n    copies: [{from: a, to: b}]\n",
        "invalid pattern in 'exclude'",
    );
    assert_config_error(
        "targets:\n  t:\n    copies: [{from: a, to: b}]\nproject_types:\n  p: {name: P}\n",
        "project_types.p.files",
    );
}

#[test]
fn test_nested_token_values_are_rejected() {
    assert_config_error(
        "template_vars: {A: {nested: true}}\ntargets:\n  t:\n    copies: [{from: a, to: b}]\n",
        "invalid manifest",
    );
}

#[test]
fn test_unknown_keys() {
    let manifest = parse_manifest(MANIFEST).unwrap();
    assert!(matches!(manifest.target("vim"), Err(Error::UnknownTarget { .. })));
    assert!(matches!(manifest.project_type("hugo"), Err(Error::UnknownProjectType { .. })));
}

#[test]
fn test_load_manifest_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_manifest(temp_dir.path().join("map.yaml"));
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_external_resources() {
    let resources = parse_external_resources(
        "repos:\n  awesome:\n    url: https://example.com/awesome.git\n    subfolder: vendor\n    folders: [agents, prompts]\n",
    )
    .unwrap();
    let repo = resources.repo("awesome").unwrap();
    assert_eq!(repo.subfolder, PathBuf::from("vendor"));
    assert_eq!(repo.folders.len(), 2);
    assert!(matches!(resources.repo("other"), Err(Error::UnknownRepository { .. })));

    let result = parse_external_resources("repos:\n  x:\n    url: u\n    subfolder: s\n");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
