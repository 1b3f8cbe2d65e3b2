//! Theme stylesheet loading.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::github::WidgetError;

/// Host serving the widget's theme stylesheets.
pub const DEFAULT_THEME_BASE: &str = "https://utteranc.es";

const THEME_TIMEOUT_SECS: u64 = 10;

/// Loads the widget theme for an embedding origin.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThemeLoader: Send + Sync {
    /// Loads `theme`; `origin` identifies the page the theme is applied for.
    async fn load_theme(&self, theme: &str, origin: &str) -> Result<(), WidgetError>;
}

/// Fetches theme stylesheets over HTTP.
#[derive(Debug, Clone)]
pub struct HttpThemeLoader {
    client: Client,
    base: Url,
}

impl HttpThemeLoader {
    /// Creates a loader for stylesheets hosted under `base`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Configuration` when the HTTP client cannot be
    /// built.
    pub fn new(base: Url) -> Result<Self, WidgetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(THEME_TIMEOUT_SECS))
            .build()
            .map_err(|error| WidgetError::Configuration {
                message: format!("failed to configure theme HTTP client: {error}"),
            })?;
        Ok(Self { client, base })
    }

    /// URL of the stylesheet for `theme`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Theme` for names outside `[a-z0-9-]`.
    pub fn stylesheet_url(&self, theme: &str) -> Result<Url, WidgetError> {
        let valid = !theme.is_empty()
            && theme
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !valid {
            return Err(WidgetError::Theme {
                message: format!("invalid theme name '{theme}'"),
            });
        }

        let root = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{root}/stylesheets/themes/{theme}/utterances.css"))
            .map_err(|error| WidgetError::InvalidUrl(error.to_string()))
    }
}

#[async_trait]
impl ThemeLoader for HttpThemeLoader {
    async fn load_theme(&self, theme: &str, origin: &str) -> Result<(), WidgetError> {
        let url = self.stylesheet_url(theme)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| WidgetError::Network {
                message: format!("theme request failed: {error}"),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WidgetError::Theme {
                message: format!("{url} returned status {}", status.as_u16()),
            });
        }

        let stylesheet = response.text().await.map_err(|error| WidgetError::Theme {
            message: format!("theme body could not be read: {error}"),
        })?;
        tracing::debug!(theme, origin, bytes = stylesheet.len(), "theme loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HttpThemeLoader, ThemeLoader};
    use crate::github::WidgetError;

    fn loader_for(server: &MockServer) -> HttpThemeLoader {
        let base = Url::parse(&server.uri()).expect("server uri should parse");
        HttpThemeLoader::new(base).expect("client should build")
    }

    #[rstest]
    #[tokio::test]
    async fn loads_stylesheet_for_theme() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stylesheets/themes/github-dark/utterances.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body { color: white; }"))
            .expect(1)
            .mount(&server)
            .await;
        let loader = loader_for(&server);

        loader
            .load_theme("github-dark", "https://blog.example")
            .await
            .expect("theme should load");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_stylesheet_is_a_theme_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let loader = loader_for(&server);

        let error = loader
            .load_theme("no-such-theme", "https://blog.example")
            .await
            .expect_err("missing theme should fail");

        assert!(
            matches!(error, WidgetError::Theme { .. }),
            "expected Theme, got {error:?}"
        );
    }

    #[rstest]
    #[case::traversal("../secrets")]
    #[case::uppercase("GitHub")]
    #[case::empty("")]
    fn rejects_unsafe_theme_names(#[case] theme: &str) {
        let base = Url::parse("https://themes.example").expect("base should parse");
        let loader = HttpThemeLoader::new(base).expect("client should build");

        assert!(matches!(
            loader.stylesheet_url(theme),
            Err(WidgetError::Theme { .. })
        ));
    }
}
