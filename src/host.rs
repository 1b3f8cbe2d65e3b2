//! The page hosting the embedded widget.

/// Side effects the widget requests from its embedding host.
#[cfg_attr(test, mockall::automock)]
pub trait EmbedHost: Send + Sync {
    /// Starts reporting the widget's height to the parent `origin`.
    fn start_measuring(&self, origin: &str);

    /// Asks for a re-measure after the visible height changed.
    fn schedule_measure(&self);

    /// Shows the reaction controls, interactive only for signed-in viewers.
    fn enable_reactions(&self, enabled: bool);
}

/// Host that only records requests in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

impl EmbedHost for LoggingHost {
    fn start_measuring(&self, origin: &str) {
        tracing::debug!(origin, "measuring widget height");
    }

    fn schedule_measure(&self) {
        tracing::trace!("re-measure scheduled");
    }

    fn enable_reactions(&self, enabled: bool) {
        tracing::debug!(enabled, "reactions enabled");
    }
}
