//! Data models for issues, comments, users, and repository configuration.
//!
//! Types prefixed with `Api` are internal deserialisation targets that convert
//! into public domain types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::WidgetError;
use super::locator::IssueNumber;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// The authenticated viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// GitHub login.
    pub login: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Profile URL.
    pub html_url: Option<String>,
}

/// Issue backing a page's comment thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number.
    pub number: IssueNumber,
    /// Issue title (the page's issue term for lazily created issues).
    pub title: Option<String>,
    /// HTML URL for displaying to a user.
    pub html_url: Option<String>,
    /// Number of comments on the thread.
    pub comments: u32,
    /// Whether the conversation is locked.
    pub locked: bool,
}

/// Reaction counts attached to a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ReactionSummary {
    /// Total reactions of any kind.
    #[serde(default)]
    pub total_count: u32,
    /// Thumbs up.
    #[serde(default, rename = "+1")]
    pub plus_one: u32,
    /// Thumbs down.
    #[serde(default, rename = "-1")]
    pub minus_one: u32,
    /// Laugh.
    #[serde(default)]
    pub laugh: u32,
    /// Hooray.
    #[serde(default)]
    pub hooray: u32,
    /// Confused.
    #[serde(default)]
    pub confused: u32,
    /// Heart.
    #[serde(default)]
    pub heart: u32,
    /// Rocket.
    #[serde(default)]
    pub rocket: u32,
    /// Eyes.
    #[serde(default)]
    pub eyes: u32,
}

/// A comment on the issue thread.
///
/// Comment identifiers increase with creation time, which is what the
/// timeline relies on to keep the rendered sequence in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment author, absent for deleted accounts.
    pub author: Option<String>,
    /// Author avatar URL.
    pub author_avatar_url: Option<String>,
    /// Relationship of the author to the repository (e.g. `OWNER`).
    pub author_association: Option<String>,
    /// Markdown body.
    pub body: Option<String>,
    /// Rendered HTML body when requested with the HTML media type.
    pub body_html: Option<String>,
    /// Permalink.
    pub html_url: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Reaction counts.
    pub reactions: ReactionSummary,
}

/// Origins permitted to post to a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoConfig {
    /// Allow-listed origins, e.g. `https://example.com`.
    pub origins: BTreeSet<String>,
}

impl RepoConfig {
    /// Builds a configuration from any iterable of origins.
    pub fn from_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true when `origin` is allow-listed.
    #[must_use]
    pub fn permits(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }
}

/// Request body for lazily creating a page's issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Issue title, the page's issue term.
    pub title: String,
    /// Issue body linking back to the page.
    pub body: String,
    /// Labels applied on creation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl NewIssue {
    /// Builds the issue for a page.
    ///
    /// The body carries the page title as a heading, the description, and a
    /// link back to the page.
    #[must_use]
    pub fn for_page(
        term: &str,
        url: &str,
        title: &str,
        description: Option<&str>,
        label: Option<&str>,
    ) -> Self {
        let body = format!(
            "# {title}\n\n{description}\n\n[{url}]({url})",
            description = description.unwrap_or_default()
        );
        Self {
            title: term.to_owned(),
            body,
            labels: label
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssue {
    pub(crate) number: u64,
    pub(crate) title: Option<String>,
    pub(crate) html_url: Option<String>,
    #[serde(default)]
    pub(crate) comments: u32,
    #[serde(default)]
    pub(crate) locked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssueSearch {
    #[serde(default)]
    pub(crate) total_count: u64,
    #[serde(default)]
    pub(crate) items: Vec<ApiIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiComment {
    pub(crate) id: u64,
    pub(crate) body: Option<String>,
    pub(crate) body_html: Option<String>,
    pub(crate) html_url: Option<String>,
    pub(crate) user: Option<ApiUser>,
    pub(crate) author_association: Option<String>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) reactions: Option<ReactionSummary>,
}

/// Repository contents response for a single file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiContent {
    pub(crate) content: Option<String>,
    pub(crate) encoding: Option<String>,
}

impl TryFrom<ApiUser> for User {
    type Error = WidgetError;

    fn try_from(value: ApiUser) -> Result<Self, Self::Error> {
        let login = value.login.ok_or_else(|| WidgetError::Api {
            message: "user response is missing a login".to_owned(),
        })?;
        Ok(Self {
            login,
            avatar_url: value.avatar_url,
            html_url: value.html_url,
        })
    }
}

impl TryFrom<ApiIssue> for Issue {
    type Error = WidgetError;

    fn try_from(value: ApiIssue) -> Result<Self, Self::Error> {
        Ok(Self {
            number: IssueNumber::new(value.number)?,
            title: value.title,
            html_url: value.html_url,
            comments: value.comments,
            locked: value.locked,
        })
    }
}

impl From<ApiComment> for IssueComment {
    fn from(value: ApiComment) -> Self {
        let (author, author_avatar_url) = value
            .user
            .map_or((None, None), |user| (user.login, user.avatar_url));
        Self {
            id: value.id,
            author,
            author_avatar_url,
            author_association: value.author_association,
            body: value.body,
            body_html: value.body_html,
            html_url: value.html_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
            reactions: value.reactions.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{ApiComment, ApiIssue, Issue, IssueComment, NewIssue, RepoConfig};
    use crate::github::error::WidgetError;

    #[test]
    fn api_comment_converts_author_and_reactions() {
        let value = json!({
            "id": 11,
            "body": "Nice post",
            "body_html": "<p>Nice post</p>",
            "user": { "login": "alice", "avatar_url": "https://avatars.example/alice" },
            "author_association": "OWNER",
            "created_at": "2025-01-01T00:00:00Z",
            "reactions": { "total_count": 3, "+1": 2, "heart": 1 }
        });

        let api: ApiComment = serde_json::from_value(value).expect("comment should deserialise");
        let comment: IssueComment = api.into();

        assert_eq!(comment.id, 11);
        assert_eq!(comment.author.as_deref(), Some("alice"));
        assert_eq!(comment.body_html.as_deref(), Some("<p>Nice post</p>"));
        assert_eq!(comment.author_association.as_deref(), Some("OWNER"));
        assert_eq!(comment.reactions.total_count, 3);
        assert_eq!(comment.reactions.plus_one, 2);
        assert_eq!(comment.reactions.heart, 1);
        assert!(comment.created_at.is_some(), "timestamp should parse");
    }

    #[test]
    fn api_comment_tolerates_missing_optional_fields() {
        let api: ApiComment =
            serde_json::from_value(json!({ "id": 5 })).expect("minimal comment should parse");
        let comment: IssueComment = api.into();

        assert_eq!(comment.id, 5);
        assert!(comment.author.is_none());
        assert_eq!(comment.reactions.total_count, 0);
    }

    #[test]
    fn api_issue_with_zero_number_is_rejected() {
        let api: ApiIssue = serde_json::from_value(json!({ "number": 0 }))
            .expect("issue should deserialise");

        assert_eq!(
            Issue::try_from(api),
            Err(WidgetError::InvalidIssueNumber),
            "zero is not a valid issue number"
        );
    }

    #[test]
    fn api_issue_defaults_counts_and_lock_state() {
        let api: ApiIssue = serde_json::from_value(json!({ "number": 9, "title": "posts/hello" }))
            .expect("issue should deserialise");
        let issue = Issue::try_from(api).expect("issue should convert");

        assert_eq!(issue.number.get(), 9);
        assert_eq!(issue.comments, 0);
        assert!(!issue.locked);
    }

    #[rstest]
    #[case::with_label(Some("comments"), vec!["comments".to_owned()])]
    #[case::blank_label(Some("  "), vec![])]
    #[case::no_label(None, vec![])]
    fn new_issue_applies_label_when_present(
        #[case] label: Option<&str>,
        #[case] expected: Vec<String>,
    ) {
        let issue = NewIssue::for_page(
            "posts/hello",
            "https://blog.example/posts/hello",
            "Hello",
            Some("A first post"),
            label,
        );

        assert_eq!(issue.labels, expected);
    }

    #[test]
    fn new_issue_body_links_back_to_page() {
        let issue = NewIssue::for_page(
            "posts/hello",
            "https://blog.example/posts/hello",
            "Hello",
            None,
            None,
        );

        assert_eq!(issue.title, "posts/hello");
        assert_eq!(
            issue.body,
            "# Hello\n\n\n\n[https://blog.example/posts/hello](https://blog.example/posts/hello)"
        );
        let serialised = serde_json::to_value(&issue).expect("issue should serialise");
        assert!(serialised.get("labels").is_none(), "empty labels are omitted");
    }

    #[test]
    fn repo_config_permits_exact_origins_only() {
        let config = RepoConfig::from_origins(["https://blog.example"]);

        assert!(config.permits("https://blog.example"));
        assert!(!config.permits("https://blog.example:8080"));
        assert!(!config.permits("http://blog.example"));
    }
}
