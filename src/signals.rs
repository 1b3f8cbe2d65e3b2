//! Page-level failure signals and the dispatcher that renders them.
//!
//! Two failures are reported outside the bootstrap state machine: the app is
//! not installed on the repository, or the viewer is not logged in. Both
//! travel over an explicit channel to a [`SignalDispatcher`], which renders
//! each banner at most once. The login banner waits for bootstrap to finish
//! so it never flashes while the viewer is still being loaded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::banner::BannerRenderer;
use crate::bootstrap::ReadinessObserver;
use crate::github::WidgetError;
use crate::host::EmbedHost;
use crate::page::PageIdentity;
use crate::timeline::TimelineSink;

/// Interval between readiness checks while a login banner is pending.
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A failure the widget reports with a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetSignal {
    /// The GitHub app is not installed on the repository.
    NotInstalled,
    /// The viewer is not logged in.
    NotLoggedIn,
}

/// Sending half of the signal channel.
#[derive(Debug, Clone)]
pub struct SignalSender {
    sender: mpsc::UnboundedSender<WidgetSignal>,
}

/// Receiving half of the signal channel.
#[derive(Debug)]
pub struct SignalReceiver {
    receiver: mpsc::UnboundedReceiver<WidgetSignal>,
}

/// Creates an unbounded signal channel.
#[must_use]
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (SignalSender { sender }, SignalReceiver { receiver })
}

impl SignalSender {
    /// Sends a signal; a closed channel means nobody renders banners any more.
    pub fn send(&self, signal: WidgetSignal) {
        if self.sender.send(signal).is_err() {
            tracing::debug!(?signal, "signal dispatcher has stopped");
        }
    }

    /// Sends the signal implied by `error`, if any.
    pub fn forward(&self, error: &WidgetError) {
        if let Some(signal) = error.signal() {
            self.send(signal);
        }
    }
}

impl SignalReceiver {
    /// Receives the next signal, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<WidgetSignal> {
        self.receiver.recv().await
    }
}

/// Which banners the dispatcher rendered before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// The not-installed banner was rendered.
    pub not_installed: bool,
    /// The not-logged-in banner was rendered.
    pub not_logged_in: bool,
}

impl DispatchSummary {
    const fn finished(self) -> bool {
        self.not_installed && self.not_logged_in
    }
}

/// Progress of the login banner within one dispatcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginWait {
    Idle,
    Pending,
    Settled,
}

/// Renders signal banners into the timeline.
pub struct SignalDispatcher {
    identity: Arc<PageIdentity>,
    timeline: Arc<dyn TimelineSink>,
    host: Arc<dyn EmbedHost>,
    banners: Arc<BannerRenderer>,
    readiness: ReadinessObserver,
    poll_interval: Duration,
}

impl SignalDispatcher {
    /// Creates a dispatcher for one page.
    #[must_use]
    pub fn new(
        identity: Arc<PageIdentity>,
        timeline: Arc<dyn TimelineSink>,
        host: Arc<dyn EmbedHost>,
        banners: Arc<BannerRenderer>,
        readiness: ReadinessObserver,
    ) -> Self {
        Self {
            identity,
            timeline,
            host,
            banners,
            readiness,
            poll_interval: READINESS_POLL_INTERVAL,
        }
    }

    /// Overrides the readiness polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Renders banners for incoming signals until both were rendered or the
    /// channel closes.
    ///
    /// A pending login banner never holds back other signals: the receiver
    /// keeps draining while readiness is polled.
    pub async fn run(self, mut receiver: SignalReceiver) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let mut login = LoginWait::Idle;
        let mut channel_open = true;
        let bootstrap_done = self.wait_for_bootstrap();
        tokio::pin!(bootstrap_done);

        while !summary.finished() {
            tokio::select! {
                received = receiver.recv(), if channel_open => match received {
                    Some(signal) => self.accept(signal, &mut summary, &mut login),
                    None => channel_open = false,
                },
                ready = &mut bootstrap_done, if login == LoginWait::Pending => {
                    login = LoginWait::Settled;
                    if ready {
                        summary.not_logged_in = self.render(WidgetSignal::NotLoggedIn);
                    }
                }
                else => break,
            }
        }

        summary
    }

    fn accept(&self, signal: WidgetSignal, summary: &mut DispatchSummary, login: &mut LoginWait) {
        match signal {
            WidgetSignal::NotInstalled if !summary.not_installed => {
                summary.not_installed = self.render(signal);
            }
            WidgetSignal::NotLoggedIn if *login == LoginWait::Idle => {
                *login = LoginWait::Pending;
            }
            WidgetSignal::NotInstalled | WidgetSignal::NotLoggedIn => {
                tracing::trace!(?signal, "banner already shown or pending");
            }
        }
    }

    async fn wait_for_bootstrap(&self) -> bool {
        if self.readiness.is_complete() {
            return true;
        }

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.readiness.is_complete() {
                return true;
            }
            if self.readiness.is_abandoned() {
                tracing::warn!("bootstrap ended without completing; dropping login banner");
                return false;
            }
        }
    }

    fn render(&self, signal: WidgetSignal) -> bool {
        let banner = match signal {
            WidgetSignal::NotInstalled => self.banners.not_installed(&self.identity),
            WidgetSignal::NotLoggedIn => self.banners.not_logged_in(&self.identity),
        };

        match banner {
            Ok(rendered) => {
                self.timeline.show_banner(rendered);
                self.host.schedule_measure();
                true
            }
            Err(error) => {
                tracing::error!(?signal, %error, "failed to render banner");
                false
            }
        }
    }
}
