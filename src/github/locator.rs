//! Repository and issue identity wrappers.

use url::Url;

use super::error::WidgetError;

/// Default REST API base for github.com.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Repository file holding the origin allow-list.
pub const REPO_CONFIG_FILE: &str = "utterances.json";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, WidgetError> {
        if value.is_empty() {
            return Err(WidgetError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, WidgetError> {
        if value.is_empty() {
            return Err(WidgetError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Issue number, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Validates that the number is positive.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidIssueNumber` for zero.
    pub const fn new(value: u64) -> Result<Self, WidgetError> {
        if value == 0 {
            return Err(WidgetError::InvalidIssueNumber);
        }
        Ok(Self(value))
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) const fn at_least_one(value: u64) -> Self {
        if value == 0 {
            Self(1)
        } else {
            Self(value)
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for IssueNumber {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, WidgetError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(WidgetError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Target repository together with the API base used to reach it.
///
/// # Example
///
/// ```
/// use issuethread::github::locator::RepositoryLocator;
///
/// let locator = RepositoryLocator::from_slug("https://api.github.com", "octo/blog")
///     .expect("should parse repository slug");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.repository().as_str(), "blog");
/// assert_eq!(locator.slug(), "octo/blog");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a locator from an API base and an `owner/repo` slug.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidUrl` when the API base cannot be parsed
    /// and `MissingPathSegments` when the slug is not exactly `owner/repo`.
    pub fn from_slug(api_base: &str, slug: &str) -> Result<Self, WidgetError> {
        let api_base =
            Url::parse(api_base).map_err(|error| WidgetError::InvalidUrl(error.to_string()))?;

        let (owner_segment, repository_segment) = slug
            .trim()
            .split_once('/')
            .ok_or(WidgetError::MissingPathSegments)?;
        if repository_segment.contains('/') {
            return Err(WidgetError::MissingPathSegments);
        }

        Ok(Self {
            api_base,
            owner: RepositoryOwner::new(owner_segment)?,
            repository: RepositoryName::new(repository_segment)?,
        })
    }

    /// API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Repository in `owner/repo` form.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    pub(crate) fn issues_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn issue_path(&self, number: IssueNumber) -> String {
        format!("{}/{}", self.issues_path(), number.get())
    }

    pub(crate) fn issue_comments_path(&self, number: IssueNumber) -> String {
        format!("{}/{}/comments", self.issues_path(), number.get())
    }

    pub(crate) fn repo_config_path(&self) -> String {
        format!(
            "/repos/{}/{}/contents/{REPO_CONFIG_FILE}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}
