//! issuethread library crate: a comment thread backed by a GitHub issue.
//!
//! A page is mapped to one issue in a repository. The widget loads the
//! viewer, the issue, and the theme together, renders comments with
//! progressive disclosure of long threads, and lets signed-in viewers post
//! once the embedding origin is allow-listed by the repository.

pub mod auth;
pub mod banner;
pub mod bootstrap;
pub mod comments;
pub mod config;
pub mod github;
pub mod host;
pub mod origin_gate;
pub mod page;
pub mod resolver;
pub mod signals;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod theme;
pub mod timeline;

pub use auth::{ConfiguredTokenSource, TokenSource};
pub use banner::{Banner, BannerKind, BannerRenderer};
pub use bootstrap::{Bootstrap, BootstrapOutcome, BootstrapState, Session, WidgetServices};
pub use comments::{Activation, CommentPagePlan, HiddenPageLoader};
pub use config::WidgetConfig;
pub use github::{
    GatewayConnector, IssueGateway, OctocrabConnector, OctocrabIssueGateway, PAGE_SIZE,
    WidgetError,
};
pub use host::{EmbedHost, LoggingHost};
pub use page::{IssueKey, IssueMapping, PageIdentity};
pub use signals::{SignalDispatcher, WidgetSignal, signal_channel};
pub use theme::{HttpThemeLoader, ThemeLoader};
pub use timeline::{Timeline, TimelineSink};
