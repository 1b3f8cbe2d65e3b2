//! Loader for the pages skipped by the eager fetch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::github::{IssueComment, IssueGateway, IssueNumber, WidgetError};
use crate::timeline::{LoaderId, TimelineSink};

/// Result of activating the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A page was fetched and rendered.
    Revealed {
        /// 1-based page index.
        page: u32,
        /// Comments of that page, in creation order.
        comments: Vec<IssueComment>,
    },
    /// Another activation is already fetching; nothing was done.
    Busy,
    /// Every hidden page has been revealed.
    Drained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle { loader: LoaderId, anchor: u64 },
    Busy { loader: LoaderId, anchor: u64 },
    Drained,
}

#[derive(Debug)]
struct LoaderState {
    next_page: u32,
    hidden_pages: u32,
    phase: Phase,
}

/// State machine revealing hidden pages one at a time.
///
/// Hidden pages are contiguous and start at page 2. Each activation moves
/// the loader from idle to busy under a lock before fetching, so concurrent
/// activations never fetch the same page twice.
pub struct HiddenPageLoader {
    gateway: Arc<dyn IssueGateway>,
    timeline: Arc<dyn TimelineSink>,
    issue: IssueNumber,
    page_size: u32,
    state: Mutex<LoaderState>,
}

impl HiddenPageLoader {
    /// Wraps a loader already shown in the timeline after `anchor`.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn IssueGateway>,
        timeline: Arc<dyn TimelineSink>,
        issue: IssueNumber,
        page_size: u32,
        hidden_pages: u32,
        attached: (LoaderId, u64),
    ) -> Self {
        let (loader, anchor) = attached;
        let phase = if hidden_pages == 0 {
            Phase::Drained
        } else {
            Phase::Idle { loader, anchor }
        };
        Self {
            gateway,
            timeline,
            issue,
            page_size,
            state: Mutex::new(LoaderState {
                next_page: 2,
                hidden_pages,
                phase,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pages not yet revealed.
    #[must_use]
    pub fn hidden_pages(&self) -> u32 {
        self.lock().hidden_pages
    }

    /// Upper bound on the comments the loader would reveal.
    #[must_use]
    pub fn reveal_count(&self) -> u32 {
        self.hidden_pages().saturating_mul(self.page_size)
    }

    /// Whether every hidden page was revealed.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.lock().phase == Phase::Drained
    }

    /// Whether a page fetch is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.lock().phase, Phase::Busy { .. })
    }

    /// Fetches and renders the next hidden page.
    ///
    /// On success the old placeholder is replaced by the page's comments and,
    /// while pages remain, a new placeholder after the page's last comment.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error. The loader returns to idle with its
    /// counter unchanged, so the same page is fetched on the next attempt.
    pub async fn activate(&self) -> Result<Activation, WidgetError> {
        let (page, loader, anchor) = {
            let mut state = self.lock();
            let (loader, anchor) = match state.phase {
                Phase::Drained => return Ok(Activation::Drained),
                Phase::Busy { .. } => return Ok(Activation::Busy),
                Phase::Idle { loader, anchor } => (loader, anchor),
            };
            state.phase = Phase::Busy { loader, anchor };
            (state.next_page, loader, anchor)
        };

        self.timeline.set_loader_busy(loader, true);
        tracing::debug!(issue = %self.issue, page, "revealing hidden comment page");

        let comments = match self.gateway.load_comments_page(self.issue, page).await {
            Ok(comments) => comments,
            Err(error) => {
                self.timeline.set_loader_busy(loader, false);
                self.lock().phase = Phase::Idle { loader, anchor };
                return Err(error);
            }
        };

        self.timeline.remove_loader(loader);
        for comment in &comments {
            self.timeline.insert_comment(comment, false);
        }
        let next_anchor = comments.last().map_or(anchor, |comment| comment.id);

        let mut state = self.lock();
        state.hidden_pages = state.hidden_pages.saturating_sub(1);
        state.next_page = state.next_page.saturating_add(1);
        state.phase = if state.hidden_pages == 0 {
            Phase::Drained
        } else {
            let reveal = state.hidden_pages.saturating_mul(self.page_size);
            let next_loader = self.timeline.insert_page_loader(next_anchor, reveal);
            Phase::Idle {
                loader: next_loader,
                anchor: next_anchor,
            }
        };

        Ok(Activation::Revealed { page, comments })
    }

    /// Reveals every remaining page in order and returns how many comments
    /// were rendered.
    ///
    /// # Errors
    ///
    /// Stops at the first failed page and returns its error.
    pub async fn reveal_all(&self) -> Result<usize, WidgetError> {
        let mut revealed = 0_usize;
        loop {
            match self.activate().await? {
                Activation::Revealed { comments, .. } => {
                    revealed = revealed.saturating_add(comments.len());
                }
                Activation::Drained => return Ok(revealed),
                Activation::Busy => {
                    tracing::debug!("another activation is revealing pages");
                    return Ok(revealed);
                }
            }
        }
    }
}
