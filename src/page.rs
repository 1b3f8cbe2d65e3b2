//! Identity of the page embedding the widget.
//!
//! A [`PageIdentity`] is computed once from configuration and shared (in an
//! `Arc`) with every component that needs to know which repository, issue,
//! and origin it acts for.

use std::str::FromStr;

use url::Url;

use crate::github::{IssueNumber, RepositoryLocator, RepositoryName, RepositoryOwner, WidgetError};

/// Theme applied when the page does not choose one.
pub const DEFAULT_THEME: &str = "github-light";

/// The key used to find the page's issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKey {
    /// A fixed issue number; the issue is never created by the widget.
    Number(IssueNumber),
    /// A search term matched against issue titles; the issue is created
    /// lazily with the term as its title.
    Term(String),
}

/// How an issue term is derived from the page when none is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueMapping {
    /// The URL path without its leading slash or file extension.
    Pathname,
    /// The full page URL without its fragment.
    Url,
    /// The document title.
    Title,
    /// The `og:title` meta tag.
    OgTitle,
}

impl FromStr for IssueMapping {
    type Err = WidgetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pathname" => Ok(Self::Pathname),
            "url" => Ok(Self::Url),
            "title" => Ok(Self::Title),
            "og:title" => Ok(Self::OgTitle),
            other => Err(WidgetError::Configuration {
                message: format!(
                    "unknown issue mapping '{other}'; expected pathname, url, title, or og:title"
                ),
            }),
        }
    }
}

impl IssueMapping {
    /// Derives the issue term for a page.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::MissingIssueKey` when the mapping relies on a
    /// title that the page does not provide.
    pub fn term_for(
        self,
        url: &Url,
        title: Option<&str>,
        og_title: Option<&str>,
    ) -> Result<String, WidgetError> {
        let required = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(ToOwned::to_owned)
                .ok_or(WidgetError::MissingIssueKey)
        };

        match self {
            Self::Pathname => Ok(pathname_term(url.path())),
            Self::Url => {
                let mut page = url.clone();
                page.set_fragment(None);
                Ok(page.to_string())
            }
            Self::Title => required(title),
            Self::OgTitle => required(og_title),
        }
    }
}

fn pathname_term(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return "index".to_owned();
    }

    let without_extension = trimmed.rsplit_once('.').and_then(|(stem, extension)| {
        let is_word = !extension.is_empty()
            && extension
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        is_word.then_some(stem)
    });
    without_extension.unwrap_or(trimmed).to_owned()
}

/// Everything the widget knows about the embedding page.
///
/// # Example
///
/// ```
/// use issuethread::github::RepositoryLocator;
/// use issuethread::page::{IssueKey, PageIdentity};
/// use url::Url;
///
/// let repository = RepositoryLocator::from_slug("https://api.github.com", "octo/blog")
///     .expect("slug should parse");
/// let url = Url::parse("https://blog.example/posts/hello").expect("url should parse");
/// let page = PageIdentity::new(repository, IssueKey::Term("posts/hello".to_owned()), url);
///
/// assert_eq!(page.origin(), "https://blog.example");
/// assert_eq!(page.repository_slug(), "octo/blog");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    origin: String,
    repository: RepositoryLocator,
    key: IssueKey,
    url: Url,
    title: String,
    description: Option<String>,
    label: Option<String>,
    theme: String,
}

impl PageIdentity {
    /// Creates an identity whose origin is the scheme and host of `url`.
    #[must_use]
    pub fn new(repository: RepositoryLocator, key: IssueKey, url: Url) -> Self {
        Self {
            origin: url.origin().ascii_serialization(),
            repository,
            key,
            url,
            title: String::new(),
            description: None,
            label: None,
            theme: DEFAULT_THEME.to_owned(),
        }
    }

    /// Overrides the origin, e.g. when the embed is served from a proxy.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Sets the page title used in lazily created issues.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the page description used in lazily created issues.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the label applied to lazily created issues.
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Sets the theme name.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Origin of the embedding page, e.g. `https://blog.example`.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        self.repository.owner()
    }

    /// Repository name.
    #[must_use]
    pub const fn repo(&self) -> &RepositoryName {
        self.repository.repository()
    }

    /// Repository locator, including the API base.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryLocator {
        &self.repository
    }

    /// Repository in `owner/repo` form.
    #[must_use]
    pub fn repository_slug(&self) -> String {
        self.repository.slug()
    }

    /// Resolution key.
    #[must_use]
    pub const fn key(&self) -> &IssueKey {
        &self.key
    }

    /// Issue term, when the page is keyed by term.
    #[must_use]
    pub fn issue_term(&self) -> Option<&str> {
        match &self.key {
            IssueKey::Term(term) => Some(term),
            IssueKey::Number(_) => None,
        }
    }

    /// Page URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Page title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Page description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Issue label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Theme name.
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use url::Url;

    use super::{IssueKey, IssueMapping, PageIdentity};
    use crate::github::{IssueNumber, RepositoryLocator, WidgetError};

    fn page_url(raw: &str) -> Url {
        Url::parse(raw).expect("url should parse")
    }

    #[rstest]
    #[case::root("https://blog.example/", "index")]
    #[case::extension("https://blog.example/posts/hello.html", "posts/hello")]
    #[case::trailing_slash("https://blog.example/posts/hello/", "posts/hello/")]
    #[case::dotted_directory("https://blog.example/v1.2/notes", "v1.2/notes")]
    fn pathname_mapping(#[case] raw: &str, #[case] expected: &str) {
        let term = IssueMapping::Pathname
            .term_for(&page_url(raw), None, None)
            .expect("pathname always yields a term");

        assert_eq!(term, expected);
    }

    #[rstest]
    fn url_mapping_drops_fragment() {
        let term = IssueMapping::Url
            .term_for(&page_url("https://blog.example/a?b=1#comments"), None, None)
            .expect("url always yields a term");

        assert_eq!(term, "https://blog.example/a?b=1");
    }

    #[rstest]
    #[case::title(IssueMapping::Title, Some("Hello"), None, Ok("Hello".to_owned()))]
    #[case::og_title(IssueMapping::OgTitle, None, Some("Hello OG"), Ok("Hello OG".to_owned()))]
    #[case::blank_title(IssueMapping::Title, Some("  "), None, Err(WidgetError::MissingIssueKey))]
    #[case::missing_og(IssueMapping::OgTitle, Some("Hello"), None, Err(WidgetError::MissingIssueKey))]
    fn title_mappings_require_a_title(
        #[case] mapping: IssueMapping,
        #[case] title: Option<&str>,
        #[case] og_title: Option<&str>,
        #[case] expected: Result<String, WidgetError>,
    ) {
        let url = page_url("https://blog.example/posts/hello");

        assert_eq!(mapping.term_for(&url, title, og_title), expected);
    }

    #[rstest]
    #[case("pathname", IssueMapping::Pathname)]
    #[case("URL", IssueMapping::Url)]
    #[case("og:title", IssueMapping::OgTitle)]
    fn parses_mapping_names(#[case] raw: &str, #[case] expected: IssueMapping) {
        assert_eq!(raw.parse::<IssueMapping>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_mapping() {
        assert!(matches!(
            "slug".parse::<IssueMapping>(),
            Err(WidgetError::Configuration { .. })
        ));
    }

    #[rstest]
    fn origin_defaults_to_scheme_and_host() {
        let repository = RepositoryLocator::from_slug("https://api.github.com", "octo/blog")
            .expect("slug should parse");
        let number = IssueNumber::new(3).expect("three is valid");
        let page = PageIdentity::new(
            repository,
            IssueKey::Number(number),
            page_url("http://localhost:4000/posts/hello"),
        );

        assert_eq!(page.origin(), "http://localhost:4000");
        assert_eq!(page.issue_term(), None);
        assert_eq!(page.theme(), "github-light");
        assert_eq!(
            page.with_origin("https://blog.example").origin(),
            "https://blog.example"
        );
    }
}
