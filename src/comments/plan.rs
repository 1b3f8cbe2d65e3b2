//! Which comment pages to fetch up front.

use crate::github::WidgetError;

/// Remainders small enough that the last page is folded into a fuller fetch
/// of the penultimate page.
const SPARSE_LAST_PAGE: [u32; 2] = [1, 2];

/// Eager and hidden pages for a thread.
///
/// # Example
///
/// ```
/// use issuethread::comments::CommentPagePlan;
///
/// let plan = CommentPagePlan::new(92, 30).expect("page size is positive");
/// assert_eq!(plan.page_count(), 4);
/// assert_eq!(plan.eager_pages(), &[1, 3, 4]);
/// assert_eq!(plan.hidden_page_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPagePlan {
    page_size: u32,
    page_count: u32,
    eager_pages: Vec<u32>,
}

impl CommentPagePlan {
    /// Plans the fetches for `total_comments` split into pages of
    /// `page_size`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidPagination` when `page_size` is zero.
    pub fn new(total_comments: u32, page_size: u32) -> Result<Self, WidgetError> {
        if page_size == 0 {
            return Err(WidgetError::InvalidPagination {
                message: "page size must be at least 1".to_owned(),
            });
        }

        let page_count = total_comments.div_ceil(page_size);
        let remainder = total_comments.checked_rem(page_size).unwrap_or_default();

        let mut eager_pages = Vec::new();
        if page_count >= 1 {
            eager_pages.push(1);
        }
        if page_count > 2 && SPARSE_LAST_PAGE.contains(&remainder) {
            eager_pages.push(page_count.saturating_sub(1));
        }
        if page_count > 1 {
            eager_pages.push(page_count);
        }

        Ok(Self {
            page_size,
            page_count,
            eager_pages,
        })
    }

    /// Total number of pages.
    #[must_use]
    pub const fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Page size the plan was computed for.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Pages fetched immediately, ascending.
    #[must_use]
    pub fn eager_pages(&self) -> &[u32] {
        &self.eager_pages
    }

    /// Pages left behind a loader. They are always `2..2 + hidden`.
    #[must_use]
    pub fn hidden_page_count(&self) -> u32 {
        let eager = u32::try_from(self.eager_pages.len()).unwrap_or(u32::MAX);
        self.page_count.saturating_sub(eager)
    }

    /// Upper bound on the comments a loader reveals.
    #[must_use]
    pub fn hidden_comment_bound(&self) -> u32 {
        self.hidden_page_count().saturating_mul(self.page_size)
    }
}
