//! End-to-end widget flows against a mock GitHub API.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use issuethread::banner::BannerKind;
use issuethread::bootstrap::{ReadinessObserver, readiness};
use issuethread::github::RepositoryLocator;
use issuethread::signals::SignalReceiver;
use issuethread::test_support::{FakeTokenSource, RecordingHost, banner_renderer, sample_identity};
use issuethread::{
    Activation, Bootstrap, BootstrapOutcome, HiddenPageLoader, HttpThemeLoader,
    OctocrabConnector, Session, SignalDispatcher, Timeline, WidgetError, WidgetServices,
    signal_channel,
};
use rstest::rstest;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUE_COMMENTS: &str = "/api/v3/repos/octo/blog/issues/7/comments";

struct Widget {
    bootstrap: Bootstrap,
    timeline: Arc<Timeline>,
    signals: SignalReceiver,
    observer: ReadinessObserver,
}

fn widget(server: &MockServer, token: Option<&str>) -> Widget {
    let api_base = format!("{}/api/v3", server.uri());
    let locator =
        RepositoryLocator::from_slug(&api_base, "octo/blog").expect("should create locator");
    let theme_base = Url::parse(&server.uri()).expect("server uri should parse");
    let tokens = token.map_or_else(FakeTokenSource::anonymous, FakeTokenSource::with_token);
    let timeline = Arc::new(Timeline::new());
    let (sender, signals) = signal_channel();
    let (cell, observer) = readiness();

    let services = WidgetServices {
        tokens: Arc::new(tokens),
        connector: Arc::new(OctocrabConnector::new(locator)),
        themes: Arc::new(HttpThemeLoader::new(theme_base).expect("theme loader should build")),
        timeline: timeline.clone(),
        host: Arc::new(RecordingHost::default()),
        banners: Arc::new(banner_renderer()),
        signals: sender,
    };
    Widget {
        bootstrap: Bootstrap::new(Arc::new(sample_identity()), services, cell),
        timeline,
        signals,
        observer,
    }
}

fn listening(outcome: BootstrapOutcome) -> (Session, Option<HiddenPageLoader>) {
    match outcome {
        BootstrapOutcome::Listening { session, comments } => (session, comments),
        other => panic!("expected Listening, got {other:?}"),
    }
}

fn comments_json(first: u64, last: u64) -> Value {
    Value::Array(
        (first..=last)
            .map(|id| {
                json!({
                    "id": id,
                    "body_html": format!("<p>comment {id}</p>"),
                    "user": { "login": "alice" }
                })
            })
            .collect(),
    )
}

async fn mount_theme(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/stylesheets/themes/github-light/utterances.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body { color: black; }"))
        .mount(server)
        .await;
}

async fn mount_viewer(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v3/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "alice" })))
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, comments: u32) {
    Mock::given(method("GET"))
        .and(path("/api/v3/search/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "items": [{ "number": 7, "title": "posts/hello", "comments": comments }]
        })))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: u32, first: u64, last: u64) {
    Mock::given(method("GET"))
        .and(path(ISSUE_COMMENTS))
        .and(query_param("page", page.to_string()))
        .and(query_param("per_page", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments_json(first, last)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_origins(server: &MockServer, origins: &[&str]) {
    let encoded = STANDARD.encode(json!({ "origins": origins }).to_string());
    Mock::given(method("GET"))
        .and(path("/api/v3/repos/octo/blog/contents/utterances.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": encoded,
            "encoding": "base64"
        })))
        .mount(server)
        .await;
}

#[rstest]
#[tokio::test]
async fn long_thread_reveals_hidden_page_and_accepts_comment() {
    let server = MockServer::start().await;
    mount_theme(&server).await;
    mount_viewer(&server).await;
    mount_search(&server, 92).await;
    mount_page(&server, 1, 1, 30).await;
    mount_page(&server, 2, 31, 60).await;
    mount_page(&server, 3, 61, 90).await;
    mount_page(&server, 4, 91, 92).await;
    mount_origins(&server, &["https://blog.example"]).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/repos/octo/blog/issues"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ISSUE_COMMENTS))
        .and(body_partial_json(json!({ "body": "Nice post" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 93,
            "body": "Nice post",
            "user": { "login": "alice" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let mut widget = widget(&server, Some("ghp_valid"));

    let (session, comments) = listening(widget.bootstrap.run().await);
    let loader = comments.expect("page 2 should be hidden");

    let eager: Vec<u64> = (1..=30).chain(61..=92).collect();
    assert_eq!(widget.timeline.comment_ids(), eager);
    assert_eq!(widget.timeline.loaders().len(), 1);
    assert!(widget.observer.is_complete());

    let activation = loader.activate().await.expect("hidden page should load");
    assert!(matches!(activation, Activation::Revealed { page: 2, .. }));
    assert!(loader.is_drained());
    assert!(widget.timeline.loaders().is_empty());
    assert_eq!(
        widget.timeline.comment_ids(),
        (1..=92).collect::<Vec<u64>>()
    );

    widget.timeline.set_draft("Nice post");
    let posted = session.submit("Nice post").await.expect("comment should post");

    assert_eq!(posted.id, 93);
    assert_eq!(widget.timeline.comment_ids().last(), Some(&93));
    assert_eq!(widget.timeline.draft(), "");
}

#[rstest]
#[tokio::test]
async fn unpermitted_origin_never_writes() {
    let server = MockServer::start().await;
    mount_theme(&server).await;
    mount_viewer(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/search/issues"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "total_count": 0, "items": [] })),
        )
        .mount(&server)
        .await;
    mount_origins(&server, &["https://elsewhere.example"]).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let mut widget = widget(&server, Some("ghp_valid"));

    let (session, _) = listening(widget.bootstrap.run().await);
    widget.timeline.set_draft("Hello");
    let error = session.submit("Hello").await.expect_err("gate should reject");

    assert_eq!(
        error,
        WidgetError::OriginNotPermitted {
            origin: "https://blog.example".to_owned(),
            repository: "octo/blog".to_owned(),
        }
    );
    assert_eq!(widget.timeline.draft(), "Hello");
    assert!(widget.timeline.transcript().contains("! origin not permitted"));
}

#[rstest]
#[tokio::test]
async fn rejected_token_degrades_and_shows_login_banner() {
    let server = MockServer::start().await;
    mount_theme(&server).await;
    mount_search(&server, 3).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ISSUE_COMMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let Widget {
        mut bootstrap,
        timeline,
        signals,
        observer,
    } = widget(&server, Some("ghp_expired"));
    let dispatcher = SignalDispatcher::new(
        Arc::new(sample_identity()),
        timeline.clone(),
        Arc::new(RecordingHost::default()),
        Arc::new(banner_renderer()),
        observer,
    );

    let outcome = bootstrap.run().await;
    drop(bootstrap);
    let summary = dispatcher.run(signals).await;

    assert!(matches!(
        outcome,
        BootstrapOutcome::Degraded {
            error: WidgetError::Authentication { .. }
        }
    ));
    assert!(summary.not_logged_in);
    assert!(!timeline.is_mounted());
    assert!(timeline
        .banners()
        .iter()
        .any(|banner| banner.kind == BannerKind::NotLoggedIn));
}

#[rstest]
#[tokio::test]
async fn missing_theme_keeps_widget_hidden() {
    let server = MockServer::start().await;
    mount_search(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/stylesheets/themes/github-light/utterances.css"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let mut widget = widget(&server, None);

    let outcome = widget.bootstrap.run().await;

    assert!(matches!(outcome, BootstrapOutcome::Degraded { .. }));
    assert!(!widget.timeline.is_mounted());
    assert!(widget.observer.is_complete());
    assert_eq!(widget.timeline.transcript(), "(timeline not mounted)");
}
