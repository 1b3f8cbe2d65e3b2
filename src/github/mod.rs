//! GitHub access for issue-backed comment threads.
//!
//! This module wraps Octocrab to resolve a page's issue, page through its
//! comments, create the issue lazily, post comments, and read the repository's
//! origin allow-list. Errors are mapped into [`WidgetError`] variants so the
//! orchestrator can decide between degrading silently and rendering a banner.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;

pub use error::WidgetError;
pub use gateway::{
    GatewayConnector, IssueGateway, OctocrabConnector, OctocrabIssueGateway, PAGE_SIZE,
};
pub use locator::{
    IssueNumber, PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner,
};
pub use models::{Issue, IssueComment, NewIssue, ReactionSummary, RepoConfig, User};

#[cfg(test)]
pub use gateway::MockIssueGateway;
