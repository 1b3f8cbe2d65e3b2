//! Widget configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in defaults (`github-light` theme, public GitHub)
//! 2. **Configuration file** – `.issuethread.toml` in the current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `ISSUETHREAD_REPO`, `ISSUETHREAD_TOKEN`, or
//!    legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--repo`/`-r`, `--url`/`-u`, and so on
//!
//! # Configuration File
//!
//! ```toml
//! repo = "octo/blog"
//! url = "https://blog.example/posts/hello"
//! issue_mapping = "pathname"
//! title = "Hello"
//! label = "comments"
//! theme = "github-dark"
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::banner::DEFAULT_AUTHORIZE_BASE;
use crate::github::locator::DEFAULT_API_BASE;
use crate::github::{IssueNumber, RepositoryLocator, WidgetError};
use crate::page::{DEFAULT_THEME, IssueKey, IssueMapping, PageIdentity};
use crate::theme::DEFAULT_THEME_BASE;

/// Widget configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use issuethread::WidgetConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = WidgetConfig::load().expect("failed to load configuration");
/// let page = config.page_identity().expect("page identity required");
/// println!("{}", page.repository_slug());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "ISSUETHREAD",
    discovery(
        dotfile_name = ".issuethread.toml",
        config_file_name = "issuethread.toml",
        app_name = "issuethread"
    )
)]
pub struct WidgetConfig {
    /// Repository holding the comment issues, as `owner/repo`.
    ///
    /// Can be provided via:
    /// - CLI: `--repo <SLUG>` or `-r <SLUG>`
    /// - Environment: `ISSUETHREAD_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Fixed issue number backing the page.
    ///
    /// Takes precedence over `issue_term` and `issue_mapping`. Pinned issues
    /// are never created by the widget.
    #[ortho_config(cli_short = 'n')]
    pub issue_number: Option<u64>,

    /// Search term matched against issue titles.
    #[ortho_config(cli_short = 'i')]
    pub issue_term: Option<String>,

    /// How to derive the term when neither a number nor a term is set:
    /// `pathname`, `url`, `title`, or `og:title`.
    #[ortho_config(cli_short = 'm')]
    pub issue_mapping: Option<String>,

    /// URL of the embedding page.
    #[ortho_config(cli_short = 'u')]
    pub url: Option<String>,

    /// Document title of the page.
    #[ortho_config(cli_short = 'T')]
    pub title: Option<String>,

    /// `og:title` of the page.
    #[ortho_config(cli_short = 'g')]
    pub og_title: Option<String>,

    /// Page description quoted in lazily created issues.
    #[ortho_config(cli_short = 'd')]
    pub description: Option<String>,

    /// Label applied to lazily created issues.
    #[ortho_config(cli_short = 'l')]
    pub label: Option<String>,

    /// Theme name, e.g. `github-light`.
    #[ortho_config(cli_short = 's')]
    pub theme: String,

    /// Origin override; defaults to the scheme and host of `url`.
    #[ortho_config(cli_short = 'o')]
    pub origin: Option<String>,

    /// Personal access token for the viewer.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `ISSUETHREAD_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// GitHub API base URL.
    #[ortho_config(cli_short = 'A')]
    pub api_base: String,

    /// Base URL serving theme stylesheets.
    #[ortho_config(cli_short = 'S')]
    pub theme_base: String,

    /// Base URL of the sign-in service.
    #[ortho_config(cli_short = 'z')]
    pub authorize_base: String,

    /// Comment to submit once the widget is listening.
    #[ortho_config(cli_short = 'c')]
    pub comment: Option<String>,

    /// Reveals every hidden comment page before printing the thread.
    ///
    /// Can be provided via:
    /// - CLI: `--all-pages` or `-a`
    ///
    /// Note: `ISSUETHREAD_ALL_PAGES` is not supported because `ortho_config`
    /// does not load boolean values from the environment.
    #[ortho_config(cli_short = 'a')]
    pub all_pages: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            repo: None,
            issue_number: None,
            issue_term: None,
            issue_mapping: None,
            url: None,
            title: None,
            og_title: None,
            description: None,
            label: None,
            theme: DEFAULT_THEME.to_owned(),
            origin: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            theme_base: DEFAULT_THEME_BASE.to_owned(),
            authorize_base: DEFAULT_AUTHORIZE_BASE.to_owned(),
            comment: None,
            all_pages: false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

fn parse_url(value: &str) -> Result<Url, WidgetError> {
    Url::parse(value).map_err(|error| WidgetError::InvalidUrl(format!("{value}: {error}")))
}

impl WidgetConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// `None` means the viewer is anonymous.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Returns the repository slug or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Configuration`] when no repository is configured.
    pub fn require_repository(&self) -> Result<&str, WidgetError> {
        non_blank(self.repo.as_deref()).ok_or_else(|| WidgetError::Configuration {
            message: "repository is required (use --repo or -r)".to_owned(),
        })
    }

    /// Returns the page URL or an error if missing or malformed.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Configuration`] when no URL is configured and
    /// [`WidgetError::InvalidUrl`] when it does not parse.
    pub fn require_url(&self) -> Result<Url, WidgetError> {
        let raw = non_blank(self.url.as_deref()).ok_or_else(|| WidgetError::Configuration {
            message: "page URL is required (use --url or -u)".to_owned(),
        })?;
        parse_url(raw)
    }

    /// Chooses the issue key: a number, else a term, else a mapped term.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::InvalidIssueNumber`] for issue number zero,
    /// [`WidgetError::Configuration`] for an unknown mapping, and
    /// [`WidgetError::MissingIssueKey`] when nothing identifies the issue.
    pub fn issue_key(&self, url: &Url) -> Result<IssueKey, WidgetError> {
        if let Some(number) = self.issue_number {
            return IssueNumber::new(number).map(IssueKey::Number);
        }
        if let Some(term) = non_blank(self.issue_term.as_deref()) {
            return Ok(IssueKey::Term(term.to_owned()));
        }

        let mapping: IssueMapping = non_blank(self.issue_mapping.as_deref())
            .ok_or(WidgetError::MissingIssueKey)?
            .parse()?;
        mapping
            .term_for(url, self.title.as_deref(), self.og_title.as_deref())
            .map(IssueKey::Term)
    }

    /// Validates the configuration and builds the page identity.
    ///
    /// The page title falls back to `og_title`, then to the issue term.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure from the repository, URL, or
    /// issue key.
    pub fn page_identity(&self) -> Result<PageIdentity, WidgetError> {
        let repository = RepositoryLocator::from_slug(&self.api_base, self.require_repository()?)?;
        let url = self.require_url()?;
        let key = self.issue_key(&url)?;

        let title = non_blank(self.title.as_deref())
            .or_else(|| non_blank(self.og_title.as_deref()))
            .map(ToOwned::to_owned)
            .or_else(|| match &key {
                IssueKey::Term(term) => Some(term.clone()),
                IssueKey::Number(_) => None,
            })
            .unwrap_or_default();
        let theme = non_blank(Some(self.theme.as_str())).unwrap_or(DEFAULT_THEME);

        let mut identity = PageIdentity::new(repository, key, url)
            .with_title(title)
            .with_description(non_blank(self.description.as_deref()).map(ToOwned::to_owned))
            .with_label(non_blank(self.label.as_deref()).map(ToOwned::to_owned))
            .with_theme(theme);
        if let Some(origin) = non_blank(self.origin.as_deref()) {
            identity = identity.with_origin(origin.trim_end_matches('/'));
        }
        Ok(identity)
    }

    /// Parsed base URL for theme stylesheets.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::InvalidUrl`] when the base does not parse.
    pub fn theme_base_url(&self) -> Result<Url, WidgetError> {
        parse_url(&self.theme_base)
    }

    /// Parsed base URL of the sign-in service.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::InvalidUrl`] when the base does not parse.
    pub fn authorize_base_url(&self) -> Result<Url, WidgetError> {
        parse_url(&self.authorize_base)
    }
}

#[cfg(test)]
mod tests;
