//! Progressive disclosure of an issue's comments.
//!
//! Short threads are fetched whole. Longer threads show the first page and
//! the most recent page (plus the penultimate page when the last one is
//! nearly empty) and leave a single loader in place of the pages between.

mod hidden;
mod plan;

pub use hidden::{Activation, HiddenPageLoader};
pub use plan::CommentPagePlan;

use std::sync::Arc;

use futures::future::try_join_all;

use crate::github::{Issue, IssueGateway, WidgetError};
use crate::timeline::TimelineSink;

/// Fetches the eager pages of `issue` concurrently and renders them in
/// ascending page order.
///
/// Returns the loader for the hidden pages, or `None` when every page was
/// fetched.
///
/// # Errors
///
/// Returns the first page fetch error; nothing is rendered in that case.
pub async fn render_comments(
    gateway: &Arc<dyn IssueGateway>,
    timeline: &Arc<dyn TimelineSink>,
    issue: &Issue,
    page_size: u32,
) -> Result<Option<HiddenPageLoader>, WidgetError> {
    let plan = CommentPagePlan::new(issue.comments, page_size)?;
    if plan.eager_pages().is_empty() {
        return Ok(None);
    }
    tracing::debug!(
        issue = %issue.number,
        pages = ?plan.eager_pages(),
        hidden = plan.hidden_page_count(),
        "loading comment pages"
    );

    let pages = try_join_all(
        plan.eager_pages()
            .iter()
            .map(|page| gateway.load_comments_page(issue.number, *page)),
    )
    .await?;

    for comment in pages.iter().flatten() {
        timeline.insert_comment(comment, false);
    }

    if plan.hidden_page_count() == 0 {
        return Ok(None);
    }
    let Some(anchor) = pages
        .first()
        .and_then(|first| first.last())
        .map(|comment| comment.id)
    else {
        tracing::warn!(issue = %issue.number, "first comment page is empty; no loader shown");
        return Ok(None);
    };

    let loader = timeline.insert_page_loader(anchor, plan.hidden_comment_bound());
    Ok(Some(HiddenPageLoader::new(
        Arc::clone(gateway),
        Arc::clone(timeline),
        issue.number,
        page_size,
        plan.hidden_page_count(),
        (loader, anchor),
    )))
}
