//! Comment submission once the widget is listening.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::github::{Issue, IssueComment, IssueGateway, IssueNumber, WidgetError};
use crate::host::EmbedHost;
use crate::origin_gate::OriginGate;
use crate::resolver::IssueResolver;
use crate::signals::SignalSender;
use crate::timeline::TimelineSink;

/// Handles submissions from the composer.
///
/// The issue slot is locked for the whole create-then-post sequence, so
/// concurrent first submissions still create the issue exactly once.
pub struct Session {
    gateway: Arc<dyn IssueGateway>,
    resolver: IssueResolver,
    gate: OriginGate,
    timeline: Arc<dyn TimelineSink>,
    host: Arc<dyn EmbedHost>,
    signals: SignalSender,
    issue: Mutex<Option<Issue>>,
}

/// Collaborators a [`Session`] needs.
pub(crate) struct SessionParts {
    pub(crate) gateway: Arc<dyn IssueGateway>,
    pub(crate) resolver: IssueResolver,
    pub(crate) gate: OriginGate,
    pub(crate) timeline: Arc<dyn TimelineSink>,
    pub(crate) host: Arc<dyn EmbedHost>,
    pub(crate) signals: SignalSender,
}

impl Session {
    pub(crate) fn new(parts: SessionParts, issue: Option<Issue>) -> Self {
        Self {
            gateway: parts.gateway,
            resolver: parts.resolver,
            gate: parts.gate,
            timeline: parts.timeline,
            host: parts.host,
            signals: parts.signals,
            issue: Mutex::new(issue),
        }
    }

    /// The issue backing the thread, once it exists.
    pub async fn issue(&self) -> Option<Issue> {
        self.issue.lock().await.clone()
    }

    /// Posts `markdown` as a new comment.
    ///
    /// The origin is checked first; the issue is created if the thread has
    /// not started; the posted comment is appended to the timeline and the
    /// composer cleared. On any failure the composer keeps its draft.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::EmptyComment` for blank input,
    /// `WidgetError::OriginNotPermitted` when the gate rejects the page, and
    /// any gateway error from creating the issue or posting.
    pub async fn submit(&self, markdown: &str) -> Result<IssueComment, WidgetError> {
        let result = self.try_submit(markdown).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "comment submission failed");
            self.signals.forward(error);
        }
        result
    }

    async fn try_submit(&self, markdown: &str) -> Result<IssueComment, WidgetError> {
        if markdown.trim().is_empty() {
            return Err(WidgetError::EmptyComment);
        }
        self.gate.assert_origin().await?;

        let mut slot = self.issue.lock().await;
        let number = self.ensure_issue(&mut slot).await?;
        let comment = self.gateway.post_comment(number, markdown).await?;
        if let Some(issue) = slot.as_mut() {
            issue.comments = issue.comments.saturating_add(1);
            self.timeline.set_issue(issue);
        }
        drop(slot);

        self.timeline.insert_comment(&comment, true);
        self.timeline.clear_composer();
        self.host.schedule_measure();
        Ok(comment)
    }

    async fn ensure_issue(&self, slot: &mut Option<Issue>) -> Result<IssueNumber, WidgetError> {
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.number);
        }

        let created = self.resolver.create().await?;
        self.timeline.set_issue(&created);
        let number = created.number;
        *slot = Some(created);
        Ok(number)
    }
}
