//! Bootstrap state machine for the widget.
//!
//! The orchestrator acquires the viewer's token, loads the viewer, the issue,
//! and the theme concurrently, and only then mounts the timeline. Any load
//! failure leaves the widget unmounted (degraded) rather than showing partial
//! data. A mounted, unlocked thread ends in a listening [`Session`] that
//! handles comment submissions.

mod readiness;
mod session;

pub use readiness::{Readiness, ReadinessObserver, readiness};
pub use session::Session;

use std::sync::Arc;

use crate::auth::TokenSource;
use crate::banner::BannerRenderer;
use crate::comments::{HiddenPageLoader, render_comments};
use crate::github::{GatewayConnector, Issue, IssueGateway, PAGE_SIZE, WidgetError};
use crate::host::EmbedHost;
use crate::origin_gate::OriginGate;
use crate::page::PageIdentity;
use crate::resolver::IssueResolver;
use crate::signals::SignalSender;
use crate::theme::ThemeLoader;
use crate::timeline::TimelineSink;

use session::SessionParts;

/// States of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing has happened yet.
    Init,
    /// Loading the viewer's token.
    Authenticating,
    /// Loading the viewer, issue, and theme.
    Loading,
    /// A load failed; the timeline is never mounted.
    Degraded,
    /// Loads succeeded.
    Ready,
    /// The timeline is mounted and its comments rendered.
    Mounted,
    /// The composer is attached and submissions are accepted.
    Listening,
}

/// Collaborators the widget runs against.
pub struct WidgetServices {
    /// Viewer token source.
    pub tokens: Arc<dyn TokenSource>,
    /// Builds the issue gateway once the token is known.
    pub connector: Arc<dyn GatewayConnector>,
    /// Theme loader.
    pub themes: Arc<dyn ThemeLoader>,
    /// Rendered output.
    pub timeline: Arc<dyn TimelineSink>,
    /// Embedding host.
    pub host: Arc<dyn EmbedHost>,
    /// Banner templates.
    pub banners: Arc<BannerRenderer>,
    /// Channel for not-installed and not-logged-in signals.
    pub signals: SignalSender,
}

/// Where bootstrap stopped.
pub enum BootstrapOutcome {
    /// A load failed; nothing was mounted.
    Degraded {
        /// The failure that stopped bootstrap.
        error: WidgetError,
    },
    /// The thread is locked; no composer was attached.
    Mounted {
        /// Loader for hidden comment pages, if any.
        comments: Option<HiddenPageLoader>,
    },
    /// The composer is attached.
    Listening {
        /// Submission handler.
        session: Session,
        /// Loader for hidden comment pages, if any.
        comments: Option<HiddenPageLoader>,
    },
}

impl std::fmt::Debug for BootstrapOutcome {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degraded { error } => formatter
                .debug_struct("Degraded")
                .field("error", error)
                .finish(),
            Self::Mounted { comments } => formatter
                .debug_struct("Mounted")
                .field("hidden_pages", &comments.as_ref().map(HiddenPageLoader::hidden_pages))
                .finish(),
            Self::Listening { comments, .. } => formatter
                .debug_struct("Listening")
                .field("hidden_pages", &comments.as_ref().map(HiddenPageLoader::hidden_pages))
                .finish_non_exhaustive(),
        }
    }
}

/// Runs the widget's bootstrap sequence for one page.
pub struct Bootstrap {
    identity: Arc<PageIdentity>,
    services: WidgetServices,
    readiness: Readiness,
    page_size: u32,
    history: Vec<BootstrapState>,
}

impl Bootstrap {
    /// Creates an orchestrator in the `Init` state.
    #[must_use]
    pub fn new(identity: Arc<PageIdentity>, services: WidgetServices, readiness: Readiness) -> Self {
        Self {
            identity,
            services,
            readiness,
            page_size: PAGE_SIZE,
            history: vec![BootstrapState::Init],
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.history
            .last()
            .copied()
            .unwrap_or(BootstrapState::Init)
    }

    /// Every state entered so far, starting with `Init`.
    #[must_use]
    pub fn history(&self) -> &[BootstrapState] {
        &self.history
    }

    fn transition(&mut self, next: BootstrapState) {
        tracing::debug!(from = ?self.state(), to = ?next, "bootstrap transition");
        self.history.push(next);
    }

    /// Runs bootstrap to completion.
    pub async fn run(&mut self) -> BootstrapOutcome {
        self.transition(BootstrapState::Authenticating);
        let token = match self.services.tokens.load_token().await {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(%error, "token unavailable; continuing anonymously");
                None
            }
        };
        let gateway = match self.services.connector.connect(token.as_ref()) {
            Ok(gateway) => gateway,
            Err(error) => return self.degrade(error),
        };

        self.transition(BootstrapState::Loading);
        let identity = Arc::clone(&self.identity);
        let resolver = IssueResolver::new(Arc::clone(&gateway), Arc::clone(&identity));
        let loaded = tokio::try_join!(
            gateway.load_user(),
            resolver.resolve(),
            self.services
                .themes
                .load_theme(identity.theme(), identity.origin()),
        );
        let (user, issue) = match loaded {
            Ok((user, issue, ())) => (user, issue),
            Err(error) => return self.degrade(error),
        };

        self.transition(BootstrapState::Ready);
        self.services.host.start_measuring(identity.origin());
        self.readiness.mark_complete();

        let timeline = Arc::clone(&self.services.timeline);
        timeline.mount(user.as_ref(), issue.as_ref());
        let comments = self.load_comments(&gateway, issue.as_ref()).await;
        self.services.host.schedule_measure();
        self.transition(BootstrapState::Mounted);

        if issue.as_ref().is_some_and(|thread| thread.locked) {
            tracing::debug!("thread is locked; composer not attached");
            return BootstrapOutcome::Mounted { comments };
        }

        self.services.host.enable_reactions(user.is_some());
        timeline.attach_composer(user.as_ref());

        let gate = OriginGate::new(
            Arc::clone(&gateway),
            Arc::clone(&identity),
            Arc::clone(&timeline),
            Arc::clone(&self.services.host),
            Arc::clone(&self.services.banners),
        );
        let session = Session::new(
            SessionParts {
                gateway,
                resolver,
                gate,
                timeline,
                host: Arc::clone(&self.services.host),
                signals: self.services.signals.clone(),
            },
            issue,
        );
        self.transition(BootstrapState::Listening);
        BootstrapOutcome::Listening { session, comments }
    }

    async fn load_comments(
        &self,
        gateway: &Arc<dyn IssueGateway>,
        issue: Option<&Issue>,
    ) -> Option<HiddenPageLoader> {
        let thread = issue.filter(|thread| thread.comments > 0)?;
        match render_comments(gateway, &self.services.timeline, thread, self.page_size).await {
            Ok(loader) => loader,
            Err(error) => {
                tracing::warn!(%error, issue = %thread.number, "failed to load comments");
                self.services.signals.forward(&error);
                None
            }
        }
    }

    fn degrade(&mut self, error: WidgetError) -> BootstrapOutcome {
        self.transition(BootstrapState::Degraded);
        tracing::error!(%error, "bootstrap failed; widget stays hidden");
        self.services.host.start_measuring(self.identity.origin());
        self.readiness.mark_complete();
        self.services.signals.forward(&error);
        BootstrapOutcome::Degraded { error }
    }
}
