//! In-memory collaborators for exercising the widget without GitHub.
//!
//! [`FakeGateway`] serves one issue thread from memory, records every call,
//! and can delay or fail individual operations. The other fakes cover the
//! token source, gateway connector, theme loader, and embedding host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::auth::TokenSource;
use crate::banner::{BannerRenderer, DEFAULT_AUTHORIZE_BASE};
use crate::github::models::test_support::thread_comments;
use crate::github::{
    GatewayConnector, Issue, IssueComment, IssueGateway, IssueNumber, NewIssue, PAGE_SIZE,
    PersonalAccessToken, RepoConfig, RepositoryLocator, User, WidgetError,
};
use crate::host::EmbedHost;
use crate::page::{IssueKey, PageIdentity};
use crate::theme::ThemeLoader;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builds the identity used throughout the tests: `octo/blog`, keyed by the
/// term `posts/hello`, embedded on `https://blog.example/posts/hello`.
///
/// # Panics
///
/// Never in practice; the fixed inputs always parse.
#[must_use]
#[expect(clippy::expect_used, reason = "fixed fixture inputs always parse")]
pub fn sample_identity() -> PageIdentity {
    let repository = RepositoryLocator::from_slug("https://api.github.com", "octo/blog")
        .expect("fixture slug should parse");
    let url = Url::parse("https://blog.example/posts/hello").expect("fixture url should parse");
    PageIdentity::new(repository, IssueKey::Term("posts/hello".to_owned()), url)
        .with_title("Hello")
        .with_description(Some("A first post".to_owned()))
}

/// Builds a banner renderer pointing at the default authorize service.
///
/// # Panics
///
/// Never in practice; the built-in templates always compile.
#[must_use]
#[expect(clippy::expect_used, reason = "built-in templates always compile")]
pub fn banner_renderer() -> BannerRenderer {
    let base = Url::parse(DEFAULT_AUTHORIZE_BASE).expect("default authorize base should parse");
    BannerRenderer::new(base).expect("built-in templates should compile")
}

/// Gateway operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOperation {
    /// `load_user`.
    LoadUser,
    /// `load_issue_by_number` and `load_issue_by_term`.
    LoadIssue,
    /// `load_comments_page` for one page.
    CommentsPage(u32),
    /// `create_issue`.
    CreateIssue,
    /// `post_comment`.
    PostComment,
    /// `repo_config`.
    RepoConfig,
}

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    /// `load_user`.
    LoadUser,
    /// `load_issue_by_number`.
    LoadIssueByNumber(u64),
    /// `load_issue_by_term`.
    LoadIssueByTerm(String),
    /// `load_comments_page`.
    LoadCommentsPage(u32),
    /// `create_issue`.
    CreateIssue(NewIssue),
    /// `post_comment`.
    PostComment(u64, String),
    /// `repo_config`.
    RepoConfig,
}

#[derive(Debug, Clone)]
struct Failure {
    error: WidgetError,
    once: bool,
}

#[derive(Debug)]
struct FakeState {
    user: Option<User>,
    issue: Option<Issue>,
    comments: Vec<IssueComment>,
    config: RepoConfig,
    failures: HashMap<FakeOperation, Failure>,
    page_delays: HashMap<u32, Duration>,
    calls: Vec<FakeCall>,
    in_flight: u32,
    peak_in_flight: u32,
    completed_pages: Vec<u32>,
    next_comment_id: u64,
    next_issue_number: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            user: None,
            issue: None,
            comments: Vec::new(),
            config: RepoConfig::default(),
            failures: HashMap::new(),
            page_delays: HashMap::new(),
            calls: Vec::new(),
            in_flight: 0,
            peak_in_flight: 0,
            completed_pages: Vec::new(),
            next_comment_id: 10_000,
            next_issue_number: 100,
        }
    }
}

impl FakeState {
    fn take_failure(&mut self, operation: FakeOperation) -> Result<(), WidgetError> {
        let Some(failure) = self.failures.get(&operation).cloned() else {
            return Ok(());
        };
        if failure.once {
            self.failures.remove(&operation);
        }
        Err(failure.error)
    }
}

/// In-memory [`IssueGateway`] serving a single thread.
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    /// Creates a gateway with no viewer, no issue, and no allowed origins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `user` as the viewer.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        lock(&self.state).user = Some(user);
        self
    }

    /// Serves issue `number` with `count` comments numbered from 1.
    #[must_use]
    pub fn with_thread(self, number: u64, count: u32) -> Self {
        {
            let mut state = lock(&self.state);
            state.issue = Some(Issue {
                title: Some("posts/hello".to_owned()),
                ..crate::github::models::test_support::issue_with_comments(number, count)
            });
            state.comments = thread_comments(count);
        }
        self
    }

    /// Marks the served issue as locked.
    #[must_use]
    pub fn locked(self) -> Self {
        if let Some(issue) = lock(&self.state).issue.as_mut() {
            issue.locked = true;
        }
        self
    }

    /// Delays the response for `page`.
    #[must_use]
    pub fn with_page_delay(self, page: u32, delay: Duration) -> Self {
        lock(&self.state).page_delays.insert(page, delay);
        self
    }

    /// Allow-lists `origins`.
    #[must_use]
    pub fn with_origins(self, origins: &[&str]) -> Self {
        lock(&self.state).config = RepoConfig::from_origins(origins.iter().copied());
        self
    }

    /// Makes `operation` fail with `error` every time.
    #[must_use]
    pub fn failing(self, operation: FakeOperation, error: WidgetError) -> Self {
        lock(&self.state)
            .failures
            .insert(operation, Failure { error, once: false });
        self
    }

    /// Makes the next `operation` fail with `error`.
    #[must_use]
    pub fn failing_once(self, operation: FakeOperation, error: WidgetError) -> Self {
        lock(&self.state)
            .failures
            .insert(operation, Failure { error, once: true });
        self
    }

    /// Replaces the allow-list, as a repository owner editing the file would.
    pub fn set_origins(&self, origins: &[&str]) {
        lock(&self.state).config = RepoConfig::from_origins(origins.iter().copied());
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<FakeCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    #[must_use]
    pub fn count_calls(&self, predicate: impl Fn(&FakeCall) -> bool) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Pages requested, in request order.
    #[must_use]
    pub fn requested_pages(&self) -> Vec<u32> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::LoadCommentsPage(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    /// Pages whose responses completed, in completion order.
    #[must_use]
    pub fn completed_pages(&self) -> Vec<u32> {
        lock(&self.state).completed_pages.clone()
    }

    /// Highest number of page requests in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> u32 {
        lock(&self.state).peak_in_flight
    }

    /// The issue as the fake currently stores it.
    #[must_use]
    pub fn issue(&self) -> Option<Issue> {
        lock(&self.state).issue.clone()
    }

    fn record(&self, call: FakeCall) {
        lock(&self.state).calls.push(call);
    }

    fn page_slice(state: &FakeState, page: u32) -> Vec<IssueComment> {
        let size = usize::try_from(PAGE_SIZE).unwrap_or(usize::MAX);
        let index = usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX);
        state
            .comments
            .iter()
            .skip(index.saturating_mul(size))
            .take(size)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl IssueGateway for FakeGateway {
    async fn load_user(&self) -> Result<Option<User>, WidgetError> {
        self.record(FakeCall::LoadUser);
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::LoadUser)?;
        Ok(state.user.clone())
    }

    async fn load_issue_by_number(
        &self,
        number: IssueNumber,
    ) -> Result<Option<Issue>, WidgetError> {
        self.record(FakeCall::LoadIssueByNumber(number.get()));
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::LoadIssue)?;
        Ok(state.issue.clone().filter(|issue| issue.number == number))
    }

    async fn load_issue_by_term(&self, term: &str) -> Result<Option<Issue>, WidgetError> {
        self.record(FakeCall::LoadIssueByTerm(term.to_owned()));
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::LoadIssue)?;
        Ok(state.issue.clone())
    }

    async fn load_comments_page(
        &self,
        issue: IssueNumber,
        page: u32,
    ) -> Result<Vec<IssueComment>, WidgetError> {
        let delay = {
            let mut state = lock(&self.state);
            state.calls.push(FakeCall::LoadCommentsPage(page));
            state.in_flight = state.in_flight.saturating_add(1);
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
            state.page_delays.get(&page).copied()
        };

        match delay {
            Some(duration) => tokio::time::sleep(duration).await,
            None => tokio::task::yield_now().await,
        }

        let mut state = lock(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.take_failure(FakeOperation::CommentsPage(page))?;
        if state.issue.as_ref().is_none_or(|stored| stored.number != issue) {
            return Err(WidgetError::Api {
                message: format!("issue {issue} not found"),
            });
        }
        state.completed_pages.push(page);
        Ok(Self::page_slice(&state, page))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, WidgetError> {
        self.record(FakeCall::CreateIssue(issue.clone()));
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::CreateIssue)?;
        let number = IssueNumber::new(state.next_issue_number)?;
        state.next_issue_number = state.next_issue_number.saturating_add(1);
        let created = Issue {
            number,
            title: Some(issue.title.clone()),
            html_url: None,
            comments: 0,
            locked: false,
        };
        state.issue = Some(created.clone());
        Ok(created)
    }

    async fn post_comment(
        &self,
        issue: IssueNumber,
        markdown: &str,
    ) -> Result<IssueComment, WidgetError> {
        self.record(FakeCall::PostComment(issue.get(), markdown.to_owned()));
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::PostComment)?;
        let id = state.next_comment_id;
        state.next_comment_id = id.saturating_add(1);
        let author = state.user.as_ref().map(|user| user.login.clone());
        let comment = IssueComment {
            id,
            author,
            body: Some(markdown.to_owned()),
            ..IssueComment::default()
        };
        state.comments.push(comment.clone());
        if let Some(stored) = state.issue.as_mut() {
            stored.comments = stored.comments.saturating_add(1);
        }
        Ok(comment)
    }

    async fn repo_config(&self) -> Result<RepoConfig, WidgetError> {
        self.record(FakeCall::RepoConfig);
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        state.take_failure(FakeOperation::RepoConfig)?;
        Ok(state.config.clone())
    }
}

/// Connector handing out a prepared gateway and recording the tokens seen.
pub struct StaticConnector {
    gateway: Arc<dyn IssueGateway>,
    tokens: Mutex<Vec<Option<String>>>,
}

impl StaticConnector {
    /// Wraps `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn IssueGateway>) -> Self {
        Self {
            gateway,
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Tokens passed to `connect`, in call order.
    #[must_use]
    pub fn tokens(&self) -> Vec<Option<String>> {
        lock(&self.tokens).clone()
    }
}

impl GatewayConnector for StaticConnector {
    fn connect(
        &self,
        token: Option<&PersonalAccessToken>,
    ) -> Result<Arc<dyn IssueGateway>, WidgetError> {
        lock(&self.tokens).push(token.map(|value| value.value().to_owned()));
        Ok(Arc::clone(&self.gateway))
    }
}

/// Token source returning a fixed outcome.
#[derive(Debug, Clone)]
pub struct FakeTokenSource {
    outcome: Result<Option<String>, WidgetError>,
}

impl FakeTokenSource {
    /// Anonymous viewer.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { outcome: Ok(None) }
    }

    /// Viewer with `token`.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            outcome: Ok(Some(token.to_owned())),
        }
    }

    /// Token loading fails with `error`.
    #[must_use]
    pub const fn failing(error: WidgetError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn load_token(&self) -> Result<Option<PersonalAccessToken>, WidgetError> {
        match &self.outcome {
            Ok(Some(raw)) => PersonalAccessToken::new(raw).map(Some),
            Ok(None) => Ok(None),
            Err(error) => Err(error.clone()),
        }
    }
}

/// Theme loader recording requested themes.
#[derive(Debug, Default)]
pub struct FakeThemeLoader {
    failure: Option<WidgetError>,
    loaded: Mutex<Vec<(String, String)>>,
}

impl FakeThemeLoader {
    /// Loader that always fails with `error`.
    #[must_use]
    pub fn failing(error: WidgetError) -> Self {
        Self {
            failure: Some(error),
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// `(theme, origin)` pairs requested so far.
    #[must_use]
    pub fn loaded(&self) -> Vec<(String, String)> {
        lock(&self.loaded).clone()
    }
}

#[async_trait]
impl ThemeLoader for FakeThemeLoader {
    async fn load_theme(&self, theme: &str, origin: &str) -> Result<(), WidgetError> {
        lock(&self.loaded).push((theme.to_owned(), origin.to_owned()));
        tokio::task::yield_now().await;
        self.failure.clone().map_or(Ok(()), Err)
    }
}

/// Host recording every request.
#[derive(Debug, Default)]
pub struct RecordingHost {
    measuring: Mutex<Vec<String>>,
    measures: Mutex<u32>,
    reactions: Mutex<Vec<bool>>,
}

impl RecordingHost {
    /// Origins passed to `start_measuring`.
    #[must_use]
    pub fn measuring_origins(&self) -> Vec<String> {
        lock(&self.measuring).clone()
    }

    /// Number of re-measure requests.
    #[must_use]
    pub fn measure_requests(&self) -> u32 {
        *lock(&self.measures)
    }

    /// Arguments passed to `enable_reactions`.
    #[must_use]
    pub fn reactions(&self) -> Vec<bool> {
        lock(&self.reactions).clone()
    }
}

impl EmbedHost for RecordingHost {
    fn start_measuring(&self, origin: &str) {
        lock(&self.measuring).push(origin.to_owned());
    }

    fn schedule_measure(&self) {
        let mut measures = lock(&self.measures);
        *measures = measures.saturating_add(1);
    }

    fn enable_reactions(&self, enabled: bool) {
        lock(&self.reactions).push(enabled);
    }
}
