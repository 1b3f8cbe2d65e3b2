//! Gateways for reading and writing issue threads through Octocrab.
//!
//! The widget talks to GitHub exclusively through [`IssueGateway`], so the
//! orchestration logic can be exercised with mocks and fakes while
//! [`OctocrabIssueGateway`] handles real HTTP requests.

mod client;
mod connector;
mod error_mapping;
mod http_utils;
mod issues;
mod repo_config;
mod search;

pub use connector::OctocrabConnector;
pub use issues::OctocrabIssueGateway;
pub use search::select_issue_for_term;

use std::sync::Arc;

use async_trait::async_trait;

use crate::github::error::WidgetError;
use crate::github::locator::{IssueNumber, PersonalAccessToken};
use crate::github::models::{Issue, IssueComment, NewIssue, RepoConfig, User};

/// Number of comments GitHub returns per page; shared by the loader and the
/// gateway so page indices agree.
pub const PAGE_SIZE: u32 = 30;

/// Gateway that can read and write a repository's issue threads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// Fetch the authenticated viewer, or `None` when anonymous.
    async fn load_user(&self) -> Result<Option<User>, WidgetError>;

    /// Fetch an issue by number, or `None` when it does not exist.
    async fn load_issue_by_number(
        &self,
        number: IssueNumber,
    ) -> Result<Option<Issue>, WidgetError>;

    /// Search for the issue whose title matches `term`.
    async fn load_issue_by_term(&self, term: &str) -> Result<Option<Issue>, WidgetError>;

    /// Fetch one page (1-based) of comments, in creation order.
    async fn load_comments_page(
        &self,
        issue: IssueNumber,
        page: u32,
    ) -> Result<Vec<IssueComment>, WidgetError>;

    /// Create the page's issue.
    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, WidgetError>;

    /// Post a markdown comment to the issue.
    async fn post_comment(
        &self,
        issue: IssueNumber,
        markdown: &str,
    ) -> Result<IssueComment, WidgetError>;

    /// Fetch the repository's origin allow-list. Never cached.
    async fn repo_config(&self) -> Result<RepoConfig, WidgetError>;
}

/// Builds an [`IssueGateway`] once the viewer's token is known.
pub trait GatewayConnector: Send + Sync {
    /// Connect, authenticated when a token is supplied and anonymously
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be built.
    fn connect(
        &self,
        token: Option<&PersonalAccessToken>,
    ) -> Result<Arc<dyn IssueGateway>, WidgetError>;
}
