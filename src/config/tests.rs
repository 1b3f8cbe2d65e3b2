//! Unit tests for configuration loading, precedence, and page identity.

use ortho_config::{MergeComposer, OrthoConfig};
use rstest::rstest;
use serde_json::{Value, json};

use super::WidgetConfig;
use crate::github::WidgetError;
use crate::page::IssueKey;

/// Applies a configuration layer to the composer based on the layer type.
fn apply_layer(composer: &mut MergeComposer, layer_type: &str, value: Value) {
    match layer_type {
        "defaults" => composer.push_defaults(value),
        "file" => composer.push_file(value, None),
        "environment" => composer.push_environment(value),
        "cli" => composer.push_cli(value),
        _ => panic!("unknown layer type: {layer_type}"),
    }
}

fn page_config() -> WidgetConfig {
    WidgetConfig {
        repo: Some("octo/blog".to_owned()),
        url: Some("https://blog.example/posts/hello.html#comments".to_owned()),
        ..Default::default()
    }
}

#[rstest]
#[case::file_overrides_defaults(
    vec![("defaults", json!({"repo": "octo/default"})), ("file", json!({"repo": "octo/file"}))],
    "repo",
    "octo/file",
    "file should override default"
)]
#[case::environment_overrides_file(
    vec![("file", json!({"token": "file-token"})), ("environment", json!({"token": "env-token"}))],
    "token",
    "env-token",
    "environment should override file"
)]
#[case::cli_overrides_environment(
    vec![("environment", json!({"theme": "github-dark"})), ("cli", json!({"theme": "icy-dark"}))],
    "theme",
    "icy-dark",
    "CLI should override environment"
)]
fn test_layer_precedence(
    #[case] layers: Vec<(&str, Value)>,
    #[case] field: &str,
    #[case] expected: &str,
    #[case] message: &str,
) {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value);
    }

    let config = WidgetConfig::merge_from_layers(composer.layers()).expect("merge should succeed");

    let actual = match field {
        "repo" => config.repo.as_deref(),
        "token" => config.token.as_deref(),
        "theme" => Some(config.theme.as_str()),
        _ => panic!("unknown field: {field}"),
    };

    assert_eq!(actual, Some(expected), "{message}");
}

#[rstest]
fn partial_overrides_preserve_lower_values() {
    let mut composer = MergeComposer::new();
    composer.push_defaults(json!({"repo": "octo/default", "label": "comments"}));
    composer.push_cli(json!({"repo": "octo/cli"}));

    let config = WidgetConfig::merge_from_layers(composer.layers()).expect("merge should succeed");

    assert_eq!(config.repo.as_deref(), Some("octo/cli"));
    assert_eq!(config.label.as_deref(), Some("comments"), "default label kept");
}

#[rstest]
fn defaults_point_at_public_services() {
    let config = WidgetConfig::default();

    assert_eq!(config.theme, "github-light");
    assert_eq!(config.api_base, "https://api.github.com");
    assert_eq!(
        config.theme_base_url().map(String::from),
        Ok("https://utteranc.es/".to_owned())
    );
    assert_eq!(
        config.authorize_base_url().map(String::from),
        Ok("https://api.utteranc.es/".to_owned())
    );
    assert!(!config.all_pages);
}

#[rstest]
fn short_flags_reach_their_fields() {
    let _guard = env_lock::lock_env([
        ("ISSUETHREAD_TOKEN", None::<&str>),
        ("ISSUETHREAD_THEME", None),
        ("ISSUETHREAD_TITLE", None),
        ("ISSUETHREAD_API_BASE", None),
        ("ISSUETHREAD_AUTHORIZE_BASE", None),
    ]);
    let args = [
        "issuethread",
        "-t",
        "ghp_cli",
        "-T",
        "Hello",
        "-s",
        "github-dark",
        "-A",
        "https://ghe.example/api/v3",
        "-z",
        "https://auth.example",
        "-a",
    ];

    let config = WidgetConfig::load_from_iter(args).expect("short flags should parse");

    assert_eq!(config.token.as_deref(), Some("ghp_cli"));
    assert_eq!(config.title.as_deref(), Some("Hello"));
    assert_eq!(config.theme, "github-dark");
    assert_eq!(config.api_base, "https://ghe.example/api/v3");
    assert_eq!(config.authorize_base, "https://auth.example");
    assert!(config.all_pages);
}

#[rstest]
fn configured_token_wins_over_legacy_variable() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);
    let config = WidgetConfig {
        token: Some("configured".to_owned()),
        ..Default::default()
    };

    assert_eq!(config.resolve_token().as_deref(), Some("configured"));
}

#[rstest]
fn legacy_token_is_used_as_fallback() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);

    assert_eq!(
        WidgetConfig::default().resolve_token().as_deref(),
        Some("legacy-token")
    );
}

#[rstest]
#[case::absent(None)]
#[case::blank(Some("  "))]
fn missing_token_means_anonymous(#[case] token: Option<&str>) {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = WidgetConfig {
        token: token.map(ToOwned::to_owned),
        ..Default::default()
    };

    assert!(config.resolve_token().is_none());
}

#[rstest]
fn require_repository_returns_error_when_missing() {
    let config = WidgetConfig::default();
    let result = config.require_repository();

    assert!(matches!(result, Err(WidgetError::Configuration { .. })));
}

#[rstest]
#[case::missing(None, "Configuration")]
#[case::malformed(Some("not a url"), "InvalidUrl")]
fn require_url_rejects_bad_input(#[case] url: Option<&str>, #[case] kind: &str) {
    let config = WidgetConfig {
        url: url.map(ToOwned::to_owned),
        ..Default::default()
    };

    let error = config.require_url().expect_err("url should be rejected");

    let actual = match error {
        WidgetError::Configuration { .. } => "Configuration",
        WidgetError::InvalidUrl(_) => "InvalidUrl",
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(actual, kind);
}

#[rstest]
fn issue_number_takes_precedence() {
    let config = WidgetConfig {
        issue_number: Some(7),
        issue_term: Some("ignored".to_owned()),
        ..page_config()
    };

    let identity = config.page_identity().expect("identity should build");

    assert!(matches!(identity.key(), IssueKey::Number(number) if number.get() == 7));
    assert_eq!(identity.issue_term(), None);
}

#[rstest]
fn zero_issue_number_is_rejected() {
    let config = WidgetConfig {
        issue_number: Some(0),
        ..page_config()
    };

    assert_eq!(
        config.page_identity().expect_err("zero is invalid"),
        WidgetError::InvalidIssueNumber
    );
}

#[rstest]
#[case::explicit_term(Some("my term"), None, "my term")]
#[case::pathname(None, Some("pathname"), "posts/hello")]
#[case::url(None, Some("url"), "https://blog.example/posts/hello.html")]
#[case::title(None, Some("title"), "Hello")]
#[case::og_title(None, Some("og:title"), "Hello | Blog")]
fn issue_term_follows_configuration(
    #[case] term: Option<&str>,
    #[case] mapping: Option<&str>,
    #[case] expected: &str,
) {
    let config = WidgetConfig {
        issue_term: term.map(ToOwned::to_owned),
        issue_mapping: mapping.map(ToOwned::to_owned),
        title: Some("Hello".to_owned()),
        og_title: Some("Hello | Blog".to_owned()),
        ..page_config()
    };

    let identity = config.page_identity().expect("identity should build");

    assert_eq!(identity.issue_term(), Some(expected));
}

#[rstest]
#[case::nothing_configured(None, WidgetError::MissingIssueKey)]
#[case::title_missing(Some("title"), WidgetError::MissingIssueKey)]
fn missing_issue_key_is_reported(#[case] mapping: Option<&str>, #[case] expected: WidgetError) {
    let config = WidgetConfig {
        issue_mapping: mapping.map(ToOwned::to_owned),
        ..page_config()
    };

    assert_eq!(config.page_identity().expect_err("no key"), expected);
}

#[rstest]
fn unknown_mapping_is_a_configuration_error() {
    let config = WidgetConfig {
        issue_mapping: Some("slug".to_owned()),
        ..page_config()
    };

    assert!(matches!(
        config.page_identity(),
        Err(WidgetError::Configuration { .. })
    ));
}

#[rstest]
fn page_identity_carries_page_metadata() {
    let config = WidgetConfig {
        issue_mapping: Some("pathname".to_owned()),
        description: Some("A first post".to_owned()),
        label: Some(" comments ".to_owned()),
        theme: "github-dark".to_owned(),
        ..page_config()
    };

    let identity = config.page_identity().expect("identity should build");

    assert_eq!(identity.origin(), "https://blog.example");
    assert_eq!(identity.repository_slug(), "octo/blog");
    assert_eq!(identity.title(), "posts/hello", "title falls back to the term");
    assert_eq!(identity.description(), Some("A first post"));
    assert_eq!(identity.label(), Some("comments"));
    assert_eq!(identity.theme(), "github-dark");
}

#[rstest]
fn origin_override_replaces_url_origin() {
    let config = WidgetConfig {
        issue_term: Some("hello".to_owned()),
        origin: Some("https://proxy.example/".to_owned()),
        ..page_config()
    };

    let identity = config.page_identity().expect("identity should build");

    assert_eq!(identity.origin(), "https://proxy.example");
}
