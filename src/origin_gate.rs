//! Write guard checking the embedding origin against the repository's
//! allow-list.

use std::sync::Arc;

use crate::banner::BannerRenderer;
use crate::github::{IssueGateway, WidgetError};
use crate::host::EmbedHost;
use crate::page::PageIdentity;
use crate::timeline::TimelineSink;

/// Checks, before every write, that the page's origin may post.
///
/// The allow-list is fetched on each call so an updated `utterances.json`
/// takes effect on the next attempt.
pub struct OriginGate {
    gateway: Arc<dyn IssueGateway>,
    identity: Arc<PageIdentity>,
    timeline: Arc<dyn TimelineSink>,
    host: Arc<dyn EmbedHost>,
    banners: Arc<BannerRenderer>,
}

impl OriginGate {
    /// Creates a gate for the page.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn IssueGateway>,
        identity: Arc<PageIdentity>,
        timeline: Arc<dyn TimelineSink>,
        host: Arc<dyn EmbedHost>,
        banners: Arc<BannerRenderer>,
    ) -> Self {
        Self {
            gateway,
            identity,
            timeline,
            host,
            banners,
        }
    }

    /// Succeeds when the page's origin is allow-listed.
    ///
    /// Otherwise shows a banner above the composer with the suggested
    /// configuration, asks the host to re-measure, and fails.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::OriginNotPermitted` for origins missing from the
    /// allow-list, and propagates errors fetching it.
    pub async fn assert_origin(&self) -> Result<(), WidgetError> {
        let config = self.gateway.repo_config().await?;
        let origin = self.identity.origin();
        if config.permits(origin) {
            return Ok(());
        }

        let repository = self.identity.repository_slug();
        tracing::warn!(origin, %repository, "origin is not permitted to post");
        match self.banners.origin_not_permitted(&self.identity) {
            Ok(banner) => self.timeline.show_banner(banner),
            Err(error) => tracing::error!(%error, "failed to render origin banner"),
        }
        self.host.schedule_measure();

        Err(WidgetError::OriginNotPermitted {
            origin: origin.to_owned(),
            repository,
        })
    }
}
