//! Token rendering for template text.
//! Replaces `{{NAME}}` placeholders with values from a resolved token map.
use crate::tokens::TokenMap;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Placeholder syntax: an upper-snake-case name between double braces.
pub const TOKEN_PATTERN: &str = r"\{\{([A-Z0-9_]+)\}\}";

lazy_static! {
    /// Compiled once for every renderer.
    static ref TOKEN_RE: Regex = Regex::new(TOKEN_PATTERN).unwrap();
}

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given tokens.
    ///
    /// # Arguments
    /// * `template` - Template text to render
    /// * `tokens` - Resolved token values
    ///
    /// # Returns
    /// * `String` - Rendered text
    fn render(&self, template: &str, tokens: &TokenMap) -> String;
}

/// Literal `{{TOKEN}}` substitution.
///
/// Substitution is a single pass: inserted values are never scanned again, and
/// placeholders with no entry in the map are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenRenderer;

impl TokenRenderer {
    pub fn new() -> Self {
        TokenRenderer
    }
}

impl TemplateRenderer for TokenRenderer {
    fn render(&self, template: &str, tokens: &TokenMap) -> String {
        TOKEN_RE
            .replace_all(template, |caps: &Captures| match tokens.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
