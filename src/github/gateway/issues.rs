//! Octocrab implementation of the issue gateway.

use async_trait::async_trait;
use http::header::HeaderMap;
use http::{StatusCode, Uri};
use octocrab::Octocrab;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::github::error::WidgetError;
use crate::github::locator::{IssueNumber, PersonalAccessToken, RepositoryLocator};
use crate::github::models::{
    ApiComment, ApiContent, ApiIssue, ApiIssueSearch, ApiUser, Issue, IssueComment, NewIssue,
    RepoConfig, User,
};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::{
    github_status, is_not_installed_error, is_rate_limit_error, map_http_error,
    map_octocrab_error,
};
use super::http_utils::{HTML_MEDIA_TYPE, accept_headers, extract_github_message};
use super::repo_config::decode_repo_config;
use super::search::{issues_from_search, select_issue_for_term, term_query};
use super::{IssueGateway, PAGE_SIZE};

/// Octocrab-backed gateway scoped to one repository.
pub struct OctocrabIssueGateway {
    client: Octocrab,
    locator: RepositoryLocator,
    authenticated: bool,
}

#[derive(Serialize)]
struct SearchParams<'query> {
    q: &'query str,
    sort: &'static str,
    order: &'static str,
}

#[derive(Serialize)]
struct CommentBody<'body> {
    body: &'body str,
}

impl OctocrabIssueGateway {
    /// Creates a new gateway from an Octocrab client.
    ///
    /// `authenticated` records whether the client carries a viewer token;
    /// anonymous gateways never ask GitHub for the current user.
    #[must_use]
    pub const fn new(client: Octocrab, locator: RepositoryLocator, authenticated: bool) -> Self {
        Self {
            client,
            locator,
            authenticated,
        }
    }

    /// Builds an Octocrab client for the optional token and repository.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidUrl` when the base URI cannot be parsed or
    /// `WidgetError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: Option<&PersonalAccessToken>,
        locator: &RepositoryLocator,
    ) -> Result<Self, WidgetError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab, locator.clone(), token.is_some()))
    }

    /// Performs a GET and treats 404 as an absent resource.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Option<T>, WidgetError> {
        let uri: Uri = path
            .parse::<Uri>()
            .map_err(|error| WidgetError::InvalidUrl(error.to_string()))?;

        let response = self
            .client
            ._get_with_headers(uri, headers)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| WidgetError::Api {
                message: format!("{operation} response decode failed: {error}"),
            })?;

        if !status.is_success() {
            return Err(map_http_error(
                operation,
                status,
                extract_github_message(&body),
            ));
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|error| WidgetError::Api {
                message: format!("{operation} response deserialisation failed: {error}"),
            })
    }

    /// Maps an Octocrab error to a [`WidgetError`], with special handling for
    /// rate limit errors.
    async fn map_error(&self, operation: &str, error: &octocrab::Error) -> WidgetError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.fetch_rate_limit_info().await;
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = rate_limit
                    .and_then(|info| info.resets_at())
                    .map_or_else(
                        || base_message.clone(),
                        |reset| format!("{base_message} (resets at {})", reset.to_rfc3339()),
                    );

                WidgetError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }

    /// Maps a failed write; installation refusals become `NotInstalled`.
    async fn map_write_error(&self, operation: &str, error: &octocrab::Error) -> WidgetError {
        if is_not_installed_error(error) {
            return WidgetError::NotInstalled {
                repository: self.locator.slug(),
            };
        }
        self.map_error(operation, error).await
    }

    async fn fetch_rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(limit) = u32::try_from(rate.limit) else {
            return None;
        };
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        Some(RateLimitInfo {
            limit,
            remaining,
            reset_at: rate.reset,
        })
    }
}

#[async_trait]
impl IssueGateway for OctocrabIssueGateway {
    async fn load_user(&self) -> Result<Option<User>, WidgetError> {
        if !self.authenticated {
            return Ok(None);
        }

        let user: Option<ApiUser> = self.get_optional("load user", "/user", None).await?;
        user.map(User::try_from).transpose()
    }

    async fn load_issue_by_number(
        &self,
        number: IssueNumber,
    ) -> Result<Option<Issue>, WidgetError> {
        let issue: Option<ApiIssue> = self
            .get_optional("load issue", &self.locator.issue_path(number), None)
            .await?;
        issue.map(Issue::try_from).transpose()
    }

    async fn load_issue_by_term(&self, term: &str) -> Result<Option<Issue>, WidgetError> {
        let query = term_query(term, &self.locator.slug());
        let params = SearchParams {
            q: &query,
            sort: "created",
            order: "asc",
        };

        let search = match self
            .client
            .get::<ApiIssueSearch, _, _>("/search/issues", Some(&params))
            .await
        {
            Ok(search) => search,
            Err(error) => return Err(self.map_error("search issues", &error).await),
        };

        let (issues, total_count) = issues_from_search(search)?;
        Ok(select_issue_for_term(term, issues, total_count))
    }

    async fn load_comments_page(
        &self,
        issue: IssueNumber,
        page: u32,
    ) -> Result<Vec<IssueComment>, WidgetError> {
        if page == 0 {
            return Err(WidgetError::InvalidPagination {
                message: "page must be at least 1".to_owned(),
            });
        }

        let path = format!(
            "{comments}?page={page}&per_page={PAGE_SIZE}",
            comments = self.locator.issue_comments_path(issue)
        );
        let comments: Option<Vec<ApiComment>> = self
            .get_optional(
                "comments page",
                &path,
                Some(accept_headers(HTML_MEDIA_TYPE)),
            )
            .await?;

        comments
            .map(|page_comments| page_comments.into_iter().map(Into::into).collect())
            .ok_or_else(|| WidgetError::Api {
                message: format!("comments page {page} of issue {issue} not found"),
            })
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, WidgetError> {
        let created: Result<ApiIssue, octocrab::Error> =
            self.client.post(self.locator.issues_path(), Some(issue)).await;

        match created {
            Ok(api) => Issue::try_from(api),
            Err(error) if github_status(&error) == Some(StatusCode::NOT_FOUND) => {
                Err(WidgetError::NotInstalled {
                    repository: self.locator.slug(),
                })
            }
            Err(error) => Err(self.map_write_error("create issue", &error).await),
        }
    }

    async fn post_comment(
        &self,
        issue: IssueNumber,
        markdown: &str,
    ) -> Result<IssueComment, WidgetError> {
        let body = CommentBody { body: markdown };
        let posted: Result<ApiComment, octocrab::Error> = self
            .client
            .post(self.locator.issue_comments_path(issue), Some(&body))
            .await;

        match posted {
            Ok(api) => Ok(api.into()),
            Err(error) => Err(self.map_write_error("post comment", &error).await),
        }
    }

    async fn repo_config(&self) -> Result<RepoConfig, WidgetError> {
        let content: Option<ApiContent> = self
            .get_optional(
                "repository config",
                &self.locator.repo_config_path(),
                None,
            )
            .await?;

        match content {
            Some(file) => decode_repo_config(&file),
            None => {
                tracing::debug!(
                    repository = %self.locator.slug(),
                    "repository has no origin allow-list"
                );
                Ok(RepoConfig::default())
            }
        }
    }
}
