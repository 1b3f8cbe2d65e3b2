//! Rate limit details attached to rejected GitHub requests.
//!
//! Anonymous widgets share GitHub's low unauthenticated quota, so rate limit
//! rejections are common enough to deserve their own error payload.

use chrono::{DateTime, TimeDelta, Utc};

/// Quota window reported by the GitHub `rate_limit` endpoint.
///
/// # Example
///
/// ```
/// use issuethread::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo {
///     limit: 60,
///     remaining: 0,
///     reset_at: 1_700_000_000,
/// };
/// assert!(info.is_exhausted());
/// assert_eq!(info.resets_at().map(|at| at.timestamp()), Some(1_700_000_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset_at: u64,
}

impl RateLimitInfo {
    /// Whether the window has no requests left.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Reset instant, if the timestamp is representable.
    #[must_use]
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.reset_at).ok()?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// Time left until the reset as seen from `now`; zero once it passed.
    #[must_use]
    pub fn wait_from(&self, now: DateTime<Utc>) -> TimeDelta {
        self.resets_at()
            .map_or(TimeDelta::zero(), |reset| reset - now)
            .max(TimeDelta::zero())
    }
}
