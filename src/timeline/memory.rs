//! In-memory timeline that models the rendered widget.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::banner::{Banner, BannerKind, BannerPlacement};
use crate::github::{Issue, IssueComment, User};

use super::{LoaderId, TimelineSink};

/// A loader placeholder standing in for unfetched pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLoader {
    /// Loader handle.
    pub id: LoaderId,
    /// Comment the loader follows.
    pub after_comment: u64,
    /// Upper bound on the comments it reveals.
    pub reveal_count: u32,
    /// Whether a page fetch is in flight.
    pub busy: bool,
}

/// One entry of the rendered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    /// A rendered comment.
    Comment {
        /// The comment.
        comment: IssueComment,
        /// Whether the viewer just posted it.
        is_new: bool,
    },
    /// A "load more" placeholder.
    Loader(PageLoader),
}

/// State of the comment composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    /// Whether the composer is shown.
    pub attached: bool,
    /// Viewer the composer was attached for.
    pub user: Option<User>,
    /// Current draft.
    pub draft: String,
    /// Number of times the draft was cleared after a submission.
    pub cleared: u32,
}

#[derive(Debug, Default)]
struct TimelineState {
    mounted: bool,
    user: Option<User>,
    issue: Option<Issue>,
    entries: Vec<TimelineEntry>,
    banners: Vec<Banner>,
    composer: ComposerState,
    cursor: Option<u64>,
    next_loader: u64,
}

impl TimelineState {
    fn comment_position(&self, id: u64) -> Option<usize> {
        self.entries.iter().position(|entry| {
            matches!(entry, TimelineEntry::Comment { comment, .. } if comment.id == id)
        })
    }

    fn loader_position(&self, id: LoaderId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| matches!(entry, TimelineEntry::Loader(loader) if loader.id == id))
    }

    fn loader_mut(&mut self, id: LoaderId) -> Option<&mut PageLoader> {
        self.entries.iter_mut().find_map(|entry| match entry {
            TimelineEntry::Loader(loader) if loader.id == id => Some(loader),
            _ => None,
        })
    }

    fn insert_after(&mut self, anchor: Option<usize>, entry: TimelineEntry) {
        match anchor {
            Some(position) => self.entries.insert(position.saturating_add(1), entry),
            None => self.entries.push(entry),
        }
    }
}

/// In-memory [`TimelineSink`].
///
/// Keeps the ordered sequence of comments and loaders together with banners,
/// composer state, and the mounted viewer and issue. Loaders are unique per
/// anchor comment, so each gap has exactly one placeholder.
#[derive(Debug, Default)]
pub struct Timeline {
    state: Mutex<TimelineState>,
}

impl Timeline {
    /// Creates an empty, unmounted timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the composer draft, as a viewer typing would.
    pub fn set_draft(&self, draft: &str) {
        draft.clone_into(&mut self.lock().composer.draft);
    }

    /// Current composer draft.
    #[must_use]
    pub fn draft(&self) -> String {
        self.lock().composer.draft.clone()
    }

    /// Snapshot of the composer.
    #[must_use]
    pub fn composer(&self) -> ComposerState {
        self.lock().composer.clone()
    }

    /// Identifiers of rendered comments, in display order.
    #[must_use]
    pub fn comment_ids(&self) -> Vec<u64> {
        self.lock()
            .entries
            .iter()
            .filter_map(|entry| match entry {
                TimelineEntry::Comment { comment, .. } => Some(comment.id),
                TimelineEntry::Loader(_) => None,
            })
            .collect()
    }

    /// Snapshot of the rendered sequence.
    #[must_use]
    pub fn entries(&self) -> Vec<TimelineEntry> {
        self.lock().entries.clone()
    }

    /// Loader placeholders currently shown.
    #[must_use]
    pub fn loaders(&self) -> Vec<PageLoader> {
        self.lock()
            .entries
            .iter()
            .filter_map(|entry| match entry {
                TimelineEntry::Loader(loader) => Some(*loader),
                TimelineEntry::Comment { .. } => None,
            })
            .collect()
    }

    /// Banners shown so far, oldest first.
    #[must_use]
    pub fn banners(&self) -> Vec<Banner> {
        self.lock().banners.clone()
    }

    /// Whether the timeline was mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Issue the timeline is bound to.
    #[must_use]
    pub fn issue(&self) -> Option<Issue> {
        self.lock().issue.clone()
    }

    /// Viewer the timeline was mounted for.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// Renders the widget as plain text.
    #[must_use]
    pub fn transcript(&self) -> String {
        let state = self.lock();
        let mut lines = Vec::new();

        push_banners(&mut lines, &state.banners, BannerPlacement::PageTop);
        if !state.mounted {
            lines.push("(timeline not mounted)".to_owned());
            return lines.join("\n");
        }

        lines.push(match &state.issue {
            Some(issue) => format!(
                "issue {number}: {title} ({comments} comments{locked})",
                number = issue.number,
                title = issue.title.as_deref().unwrap_or("untitled"),
                comments = issue.comments,
                locked = if issue.locked { ", locked" } else { "" },
            ),
            None => "no issue yet".to_owned(),
        });
        push_banners(&mut lines, &state.banners, BannerPlacement::TimelineTop);

        for entry in &state.entries {
            lines.push(match entry {
                TimelineEntry::Comment { comment, is_new } => format_comment(comment, *is_new),
                TimelineEntry::Loader(loader) => format!(
                    "  [load up to {count} more comments{busy}]",
                    count = loader.reveal_count,
                    busy = if loader.busy { ", loading" } else { "" },
                ),
            });
        }

        push_banners(&mut lines, &state.banners, BannerPlacement::BeforeComposer);
        if state.composer.attached {
            lines.push(match &state.composer.user {
                Some(user) => format!("composer: commenting as {}", user.login),
                None => "composer: sign in to comment".to_owned(),
            });
        }
        lines.join("\n")
    }
}

fn push_banners(lines: &mut Vec<String>, banners: &[Banner], placement: BannerPlacement) {
    for banner in banners.iter().filter(|banner| banner.placement == placement) {
        let label = match banner.kind {
            BannerKind::NotInstalled => "app not installed",
            BannerKind::NotLoggedIn => "not logged in",
            BannerKind::OriginNotPermitted => "origin not permitted",
        };
        lines.push(format!("! {label}"));
    }
}

fn format_comment(comment: &IssueComment, is_new: bool) -> String {
    let body = comment
        .body
        .as_deref()
        .or(comment.body_html.as_deref())
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{marker} {id} {author}: {body}",
        marker = if is_new { "*" } else { "-" },
        id = comment.id,
        author = comment.author.as_deref().unwrap_or("ghost"),
    )
}

impl TimelineSink for Timeline {
    fn mount(&self, user: Option<&User>, issue: Option<&Issue>) {
        let mut state = self.lock();
        state.mounted = true;
        state.user = user.cloned();
        state.issue = issue.cloned();
    }

    fn set_issue(&self, issue: &Issue) {
        self.lock().issue = Some(issue.clone());
    }

    fn insert_comment(&self, comment: &IssueComment, is_new: bool) {
        let mut state = self.lock();
        if state.comment_position(comment.id).is_some() {
            tracing::debug!(comment = comment.id, "comment already rendered");
            // Later comments of the page follow the rendered copy.
            if !is_new && state.cursor.is_some() {
                state.cursor = Some(comment.id);
            }
            return;
        }

        let entry = TimelineEntry::Comment {
            comment: comment.clone(),
            is_new,
        };
        if is_new {
            state.entries.push(entry);
            return;
        }

        let anchor = state
            .cursor
            .and_then(|cursor| state.comment_position(cursor));
        state.insert_after(anchor, entry);
        state.cursor = anchor.map(|_| comment.id);
    }

    fn insert_page_loader(&self, after_comment: u64, reveal_count: u32) -> LoaderId {
        let mut state = self.lock();
        state.cursor = None;

        let existing = state.entries.iter_mut().find_map(|entry| match entry {
            TimelineEntry::Loader(loader) if loader.after_comment == after_comment => Some(loader),
            _ => None,
        });
        if let Some(loader) = existing {
            loader.reveal_count = reveal_count;
            return loader.id;
        }

        let id = LoaderId::new(state.next_loader);
        state.next_loader = state.next_loader.saturating_add(1);
        let anchor = state.comment_position(after_comment);
        state.insert_after(
            anchor,
            TimelineEntry::Loader(PageLoader {
                id,
                after_comment,
                reveal_count,
                busy: false,
            }),
        );
        id
    }

    fn set_loader_busy(&self, loader: LoaderId, busy: bool) {
        if let Some(entry) = self.lock().loader_mut(loader) {
            entry.busy = busy;
        }
    }

    fn remove_loader(&self, loader: LoaderId) {
        let mut state = self.lock();
        let Some(position) = state.loader_position(loader) else {
            return;
        };
        let removed = state.entries.remove(position);
        if let TimelineEntry::Loader(placeholder) = removed {
            state.cursor = Some(placeholder.after_comment);
        }
    }

    fn attach_composer(&self, user: Option<&User>) {
        let mut state = self.lock();
        state.composer.attached = true;
        state.composer.user = user.cloned();
    }

    fn clear_composer(&self) {
        let mut state = self.lock();
        state.composer.draft.clear();
        state.composer.cleared = state.composer.cleared.saturating_add(1);
    }

    fn show_banner(&self, banner: Banner) {
        self.lock().banners.push(banner);
    }
}
