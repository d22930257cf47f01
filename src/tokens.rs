//! Token maps and how they are resolved.
//!
//! Tokens are layered from lowest to highest precedence:
//! 1. global `template_vars` from the manifest
//! 2. command-line project metadata defaults, only for keys still missing
//! 3. per-target `template_vars` overrides
//! 4. project metadata given explicitly on the command line
//!
//! Layers 2 and 4 only exist for provisioning runs. Publishing renders with the
//! manifest layers alone.

use cruet::Inflector;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Ordered mapping of token name to substitution value.
pub type TokenMap = IndexMap<String, String>;

/// Returns true if `name` is a valid token name (`[A-Z0-9_]+`).
pub fn is_valid_token_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Merges token layers in order; later layers win on key collision.
pub fn merge_tokens<'a, I>(layers: I) -> TokenMap
where
    I: IntoIterator<Item = &'a TokenMap>,
{
    let mut merged = TokenMap::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Scalar token value as it may appear in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Null(()),
}

/// Deserializes a token mapping, stringifying scalar values.
pub(crate) fn deserialize_tokens<'de, D>(deserializer: D) -> Result<TokenMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, ScalarValue>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                ScalarValue::String(s) => s,
                ScalarValue::Bool(b) => b.to_string(),
                ScalarValue::Integer(i) => i.to_string(),
                ScalarValue::Float(f) => f.to_string(),
                ScalarValue::Null(()) => String::new(),
            };
            (key, value)
        })
        .collect())
}

/// Project metadata supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub repo_url: Option<String>,
    pub email: Option<String>,
}

const DEFAULT_PROJECT_NAME: &str = "my-project";
const DEFAULT_PROJECT_DESCRIPTION: &str = "A new project";
const DEFAULT_PROJECT_URL: &str = "https://example.com";
const DEFAULT_BASE_URL: &str = "/";

impl ProjectMetadata {
    /// Tokens for values given explicitly. These take precedence over every
    /// manifest layer.
    pub fn explicit_tokens(&self) -> TokenMap {
        let mut tokens = TokenMap::new();
        let fields = [
            ("PROJECT_NAME", &self.name),
            ("PROJECT_TITLE", &self.title),
            ("PROJECT_DESCRIPTION", &self.description),
            ("PROJECT_URL", &self.url),
            ("PROJECT_REPO_URL", &self.repo_url),
            ("PROJECT_EMAIL", &self.email),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                tokens.insert(key.to_string(), value.clone());
            }
        }
        // The tagline follows the description unless the manifest sets one.
        if let Some(description) = &self.description {
            tokens.insert("PROJECT_TAGLINE".to_string(), description.clone());
        }
        tokens
    }

    /// Default values for every metadata token, derived from whatever was
    /// given. Only applied for keys the manifest leaves unset.
    pub fn default_tokens(&self, base: &TokenMap) -> TokenMap {
        let name = self
            .name
            .clone()
            .or_else(|| base.get("PROJECT_NAME").cloned())
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
        let description = self
            .description
            .clone()
            .or_else(|| base.get("PROJECT_DESCRIPTION").cloned())
            .unwrap_or_else(|| DEFAULT_PROJECT_DESCRIPTION.to_string());

        let defaults = [
            ("PROJECT_NAME", name.clone()),
            ("PROJECT_TITLE", name.replace('-', " ").to_title_case()),
            ("PROJECT_DESCRIPTION", description.clone()),
            ("PROJECT_URL", DEFAULT_PROJECT_URL.to_string()),
            ("PROJECT_REPO_URL", format!("https://github.com/example/{name}")),
            ("PROJECT_BASE_URL", DEFAULT_BASE_URL.to_string()),
            ("PROJECT_TAGLINE", description),
        ];

        defaults
            .into_iter()
            .filter(|(key, _)| !base.contains_key(*key))
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

/// Resolves the token map for one target.
///
/// Without project metadata the result is the global values merged with the
/// target's overrides, and no defaults are filled in.
pub fn resolve_tokens(
    global: &TokenMap,
    overrides: &TokenMap,
    metadata: Option<&ProjectMetadata>,
) -> TokenMap {
    match metadata {
        Some(metadata) => {
            let defaults = metadata.default_tokens(&merge_tokens([global, overrides]));
            merge_tokens([global, &defaults, overrides, &metadata.explicit_tokens()])
        }
        None => merge_tokens([global, overrides]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> TokenMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_token_names() {
        assert!(is_valid_token_name("PROJECT_NAME"));
        assert!(is_valid_token_name("V2"));
        assert!(!is_valid_token_name("project_name"));
        assert!(!is_valid_token_name("PROJECT-NAME"));
        assert!(!is_valid_token_name(""));
    }

    #[test]
    fn test_defaults_fill_only_missing_keys() {
        let global = tokens(&[("PROJECT_NAME", "docs-site")]);
        let metadata = ProjectMetadata::default();
        let resolved = resolve_tokens(&global, &TokenMap::new(), Some(&metadata));

        assert_eq!(resolved["PROJECT_NAME"], "docs-site");
        assert_eq!(resolved["PROJECT_TITLE"], "Docs Site");
        assert_eq!(resolved["PROJECT_REPO_URL"], "https://github.com/example/docs-site");
        assert_eq!(resolved["PROJECT_TAGLINE"], "A new project");
        assert!(!resolved.contains_key("PROJECT_EMAIL"));
    }

    #[test]
    fn test_precedence_of_layers() {
        let global = tokens(&[("AUTHOR", "global"), ("PROJECT_NAME", "global-name")]);
        let overrides = tokens(&[("AUTHOR", "target"), ("PROJECT_NAME", "target-name")]);
        let metadata =
            ProjectMetadata { name: Some("cli-name".to_string()), ..Default::default() };

        let resolved = resolve_tokens(&global, &overrides, Some(&metadata));
        assert_eq!(resolved["AUTHOR"], "target");
        assert_eq!(resolved["PROJECT_NAME"], "cli-name");
    }

    #[test]
    fn test_without_metadata_no_defaults_are_added() {
        let global = tokens(&[("AUTHOR", "global")]);
        let overrides = tokens(&[("TOOL", "claude")]);

        let resolved = resolve_tokens(&global, &overrides, None);
        assert_eq!(resolved, tokens(&[("AUTHOR", "global"), ("TOOL", "claude")]));
        assert!(!resolved.contains_key("PROJECT_NAME"));
    }
}
