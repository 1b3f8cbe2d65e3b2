//! Resolution and lazy creation of the page's issue.

use std::sync::Arc;

use crate::github::{Issue, IssueGateway, NewIssue, WidgetError};
use crate::page::{IssueKey, PageIdentity};

/// Finds the issue backing a page, creating it on demand.
pub struct IssueResolver {
    gateway: Arc<dyn IssueGateway>,
    identity: Arc<PageIdentity>,
}

impl IssueResolver {
    /// Creates a resolver for the page.
    #[must_use]
    pub const fn new(gateway: Arc<dyn IssueGateway>, identity: Arc<PageIdentity>) -> Self {
        Self { gateway, identity }
    }

    /// Looks up the page's issue.
    ///
    /// `Ok(None)` means the thread has not been started yet.
    ///
    /// # Errors
    ///
    /// Propagates gateway errors unchanged.
    pub async fn resolve(&self) -> Result<Option<Issue>, WidgetError> {
        match self.identity.key() {
            IssueKey::Number(number) => self.gateway.load_issue_by_number(*number).await,
            IssueKey::Term(term) => self.gateway.load_issue_by_term(term).await,
        }
    }

    /// Creates the page's issue from its term, URL, title, description, and
    /// label.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::IssueNotFound` for pages pinned to an issue
    /// number, which are never created, and propagates gateway errors.
    pub async fn create(&self) -> Result<Issue, WidgetError> {
        let term = match self.identity.key() {
            IssueKey::Term(term) => term,
            IssueKey::Number(number) => {
                return Err(WidgetError::IssueNotFound {
                    number: number.get(),
                });
            }
        };

        let new_issue = NewIssue::for_page(
            term,
            self.identity.url().as_str(),
            self.identity.title(),
            self.identity.description(),
            self.identity.label(),
        );
        let issue = self.gateway.create_issue(&new_issue).await?;
        tracing::info!(
            issue = %issue.number,
            repository = %self.identity.repository_slug(),
            "created issue for page"
        );
        Ok(issue)
    }
}
