use provision::renderer::{TemplateRenderer, TokenRenderer};
use provision::tokens::TokenMap;

fn tokens(pairs: &[(&str, &str)]) -> TokenMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_render_known_tokens() {
    let renderer = TokenRenderer::new();
    let map = tokens(&[("PROJECT_NAME", "demo"), ("VERSION_2", "2.0")]);

    let rendered = renderer.render("# {{PROJECT_NAME}} v{{VERSION_2}}\n{{PROJECT_NAME}}", &map);
    assert_eq!(rendered, "# demo v2.0\ndemo");
}

#[test]
fn test_unknown_tokens_are_preserved() {
    let renderer = TokenRenderer::new();
    let map = tokens(&[("NAME", "X")]);

    let rendered = renderer.render("{{NAME}} and {{MISSING}}", &map);
    assert_eq!(rendered, "X and {{MISSING}}");
}

#[test]
fn test_only_upper_snake_case_is_a_token() {
    let renderer = TokenRenderer::new();
    let map = tokens(&[("NAME", "X")]);

    let template = "{{ NAME }} {{name}} {{ page.title }} {NAME}";
    assert_eq!(renderer.render(template, &map), template);
}

#[test]
fn test_substitution_is_not_recursive() {
    let renderer = TokenRenderer::new();
    let map = tokens(&[("OUTER", "{{INNER}}"), ("INNER", "deep")]);

    assert_eq!(renderer.render("{{OUTER}}", &map), "{{INNER}}");
}

#[test]
fn test_rendering_is_idempotent_for_known_tokens() {
    let renderer = TokenRenderer::new();
    let map = tokens(&[("A", "alpha"), ("B", "beta")]);
    let template = "{{A}}/{{B}}/{{A}}{{B}}";

    let once = renderer.render(template, &map);
    let twice = renderer.render(&once, &map);
    assert_eq!(once, twice);
}
