//! Sink receiving the widget's rendered output.
//!
//! The widget never touches a document directly; it drives a
//! [`TimelineSink`], which places comments relative to anchor comments and
//! manages the "load more" placeholders that stand in for unfetched pages.

mod memory;

pub use memory::{ComposerState, PageLoader, Timeline, TimelineEntry};

use crate::banner::Banner;
use crate::github::{Issue, IssueComment, User};

/// Handle to a loader placeholder inserted into the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

impl LoaderId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Destination for everything the widget renders.
pub trait TimelineSink: Send + Sync {
    /// Mounts the timeline for the viewer and the (possibly absent) issue.
    fn mount(&self, user: Option<&User>, issue: Option<&Issue>);

    /// Rebinds the timeline after the issue was created lazily.
    fn set_issue(&self, issue: &Issue);

    /// Inserts a comment.
    ///
    /// Historical comments (`is_new == false`) go directly after the current
    /// insertion anchor: the end of the sequence, or the comment a removed
    /// loader was anchored on while its page is filled in. Freshly posted
    /// comments are always appended and flagged for highlighting.
    fn insert_comment(&self, comment: &IssueComment, is_new: bool);

    /// Inserts a loader placeholder right after `after_comment` that would
    /// reveal up to `reveal_count` comments.
    fn insert_page_loader(&self, after_comment: u64, reveal_count: u32) -> LoaderId;

    /// Marks a loader as busy or idle.
    fn set_loader_busy(&self, loader: LoaderId, busy: bool);

    /// Removes a loader, making its anchor the insertion point.
    fn remove_loader(&self, loader: LoaderId);

    /// Attaches the comment composer for the viewer.
    fn attach_composer(&self, user: Option<&User>);

    /// Clears the composer's draft after a successful submission.
    fn clear_composer(&self);

    /// Shows a banner.
    fn show_banner(&self, banner: Banner);
}
