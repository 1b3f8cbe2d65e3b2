//! Error types exposed by the widget and its GitHub layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;
use crate::signals::WidgetSignal;

/// Errors surfaced while configuring the widget or talking to GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WidgetError {
    /// A URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The repository was not given as `owner/repo`.
    #[error("repository must be given as owner/repo")]
    MissingPathSegments,

    /// The issue number is not a valid integer.
    #[error("issue number must be a positive integer")]
    InvalidIssueNumber,

    /// The authentication token was blank.
    #[error("personal access token must not be blank")]
    MissingToken,

    /// Neither an issue number, an issue term nor a mapping was configured.
    #[error("an issue number, issue term, or issue mapping is required")]
    MissingIssueKey,

    /// The page pins an issue number that does not exist upstream.
    #[error("issue #{number} does not exist")]
    IssueNotFound {
        /// The configured issue number.
        number: u64,
    },

    /// The viewer tried to post an empty comment.
    #[error("comment body must not be empty")]
    EmptyComment,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401 response.
        message: String,
    },

    /// The comments app is not installed on the repository.
    #[error("the comments app is not installed on {repository}")]
    NotInstalled {
        /// Repository in `owner/repo` form.
        repository: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403 with rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },

    /// The embedding origin is not on the repository's allow-list.
    #[error("{origin} is not permitted to post to {repository}")]
    OriginNotPermitted {
        /// Origin of the embedding page.
        origin: String,
        /// Repository in `owner/repo` form.
        repository: String,
    },

    /// The theme stylesheet could not be loaded.
    #[error("theme error: {message}")]
    Theme {
        /// Details about the theme failure.
        message: String,
    },

    /// A banner template failed to render.
    #[error("template error: {message}")]
    Template {
        /// Error reported by the template engine.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

impl WidgetError {
    /// Returns the page-level signal this failure should raise, if any.
    ///
    /// Rejected credentials mean the viewer is not logged in; a missing app
    /// installation is reported separately so the embedder can act on it.
    #[must_use]
    pub const fn signal(&self) -> Option<WidgetSignal> {
        match self {
            Self::Authentication { .. } => Some(WidgetSignal::NotLoggedIn),
            Self::NotInstalled { .. } => Some(WidgetSignal::NotInstalled),
            _ => None,
        }
    }
}
