//! Test helpers for constructing issue, comment, and user fixtures.
//!
//! # Examples
//!
//! ```
//! use issuethread::github::models::test_support::{comment_with_id, issue_with_comments};
//!
//! let issue = issue_with_comments(7, 92);
//! assert_eq!(issue.comments, 92);
//!
//! let comment = comment_with_id(3);
//! assert_eq!(comment.body.as_deref(), Some("comment 3"));
//! ```

use super::{Issue, IssueComment, User};
use crate::github::locator::IssueNumber;

/// Creates a user with the given login.
#[must_use]
pub fn user(login: &str) -> User {
    User {
        login: login.to_owned(),
        avatar_url: None,
        html_url: Some(format!("https://github.com/{login}")),
    }
}

/// Creates an unlocked issue with the given number and comment count.
///
/// Zero is mapped to issue 1 so fixtures never need to handle the error.
#[must_use]
pub fn issue_with_comments(number: u64, comments: u32) -> Issue {
    Issue {
        number: IssueNumber::at_least_one(number),
        title: Some(format!("thread {number}")),
        html_url: None,
        comments,
        locked: false,
    }
}

/// Creates a comment with the body "comment {id}" by "alice".
#[must_use]
pub fn comment_with_id(id: u64) -> IssueComment {
    IssueComment {
        id,
        author: Some("alice".to_owned()),
        body: Some(format!("comment {id}")),
        ..Default::default()
    }
}

/// Creates `count` consecutive comments with identifiers starting at 1.
#[must_use]
pub fn thread_comments(count: u32) -> Vec<IssueComment> {
    (1..=u64::from(count)).map(comment_with_id).collect()
}

