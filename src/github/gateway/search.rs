//! Selection of the thread issue from title search results.

use crate::github::error::WidgetError;
use crate::github::models::{ApiIssueSearch, Issue};

/// Builds the search query for an issue term scoped to one repository.
pub(super) fn term_query(term: &str, repository: &str) -> String {
    format!("\"{term}\" type:issue in:title repo:{repository}")
}

/// Picks the issue for `term` from search results sorted by creation.
///
/// GitHub's title search is fuzzy, so the first result whose title contains
/// the term (case-insensitively) wins. Returns `None` when nothing matches.
#[must_use]
pub fn select_issue_for_term(term: &str, results: Vec<Issue>, total_count: u64) -> Option<Issue> {
    if total_count == 0 {
        return None;
    }
    if total_count > 1 {
        tracing::warn!(term, total_count, "multiple issues match the page term");
    }

    let needle = term.to_lowercase();
    let found = results.into_iter().find(|issue| {
        issue
            .title
            .as_deref()
            .is_some_and(|title| title.to_lowercase().contains(&needle))
    });
    if found.is_none() {
        tracing::warn!(term, "no search result title contains the page term");
    }
    found
}

pub(super) fn issues_from_search(
    search: ApiIssueSearch,
) -> Result<(Vec<Issue>, u64), WidgetError> {
    let issues = search
        .items
        .into_iter()
        .map(Issue::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((issues, search.total_count))
}
