//! issuethread CLI entrypoint: mounts the thread for one page and prints it.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use issuethread::bootstrap::readiness;
use issuethread::{
    BannerRenderer, Bootstrap, BootstrapOutcome, ConfiguredTokenSource, EmbedHost,
    HttpThemeLoader, LoggingHost, OctocrabConnector, SignalDispatcher, Timeline, WidgetConfig,
    WidgetError, WidgetServices, signal_channel,
};
use ortho_config::OrthoConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

async fn run() -> Result<(), WidgetError> {
    let config = load_config()?;
    let identity = Arc::new(config.page_identity()?);

    let timeline = Arc::new(Timeline::new());
    let host: Arc<dyn EmbedHost> = Arc::new(LoggingHost);
    let banners = Arc::new(BannerRenderer::new(config.authorize_base_url()?)?);
    let (sender, receiver) = signal_channel();
    let (cell, observer) = readiness();

    let dispatcher = SignalDispatcher::new(
        Arc::clone(&identity),
        timeline.clone(),
        Arc::clone(&host),
        Arc::clone(&banners),
        observer,
    );
    let dispatch = tokio::spawn(dispatcher.run(receiver));

    let services = WidgetServices {
        tokens: Arc::new(ConfiguredTokenSource::new(config.resolve_token())),
        connector: Arc::new(OctocrabConnector::new(identity.repository().clone())),
        themes: Arc::new(HttpThemeLoader::new(config.theme_base_url()?)?),
        timeline: timeline.clone(),
        host,
        banners,
        signals: sender,
    };
    let mut bootstrap = Bootstrap::new(identity, services, cell);
    let outcome = bootstrap.run().await;
    let result = drive(outcome, &config, &timeline).await;

    // The dispatcher stops once every signal sender is gone.
    drop(bootstrap);
    match dispatch.await {
        Ok(summary) => tracing::debug!(?summary, "signal dispatcher finished"),
        Err(error) => tracing::warn!(%error, "signal dispatcher failed"),
    }

    write_transcript(&timeline)?;
    result
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`WidgetError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<WidgetConfig, WidgetError> {
    WidgetConfig::load().map_err(|error| WidgetError::Configuration {
        message: error.to_string(),
    })
}

async fn drive(
    outcome: BootstrapOutcome,
    config: &WidgetConfig,
    timeline: &Timeline,
) -> Result<(), WidgetError> {
    let (session, comments) = match outcome {
        BootstrapOutcome::Degraded { error } => return Err(error),
        BootstrapOutcome::Mounted { comments } => (None, comments),
        BootstrapOutcome::Listening { session, comments } => (Some(session), comments),
    };

    if let Some(loader) = comments.as_ref().filter(|_| config.all_pages) {
        let revealed = loader.reveal_all().await?;
        tracing::info!(revealed, "revealed hidden comments");
    }

    let Some(markdown) = config.comment.as_deref() else {
        return Ok(());
    };
    let Some(session) = session else {
        return Err(WidgetError::Configuration {
            message: "the thread is locked and accepts no new comments".to_owned(),
        });
    };
    timeline.set_draft(markdown);
    let posted = session.submit(markdown).await?;
    tracing::info!(comment = posted.id, "comment posted");
    Ok(())
}

fn write_transcript(timeline: &Timeline) -> Result<(), WidgetError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", timeline.transcript()).map_err(|error| WidgetError::Io {
        message: error.to_string(),
    })
}
