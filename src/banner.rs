//! Error banners rendered inside the widget.
//!
//! Banners are the only user-visible failure surface: the app is not
//! installed, the viewer is not logged in, or the embedding origin may not
//! post to the repository. Each is rendered from a small `minijinja`
//! template with HTML auto-escaping enabled.

use minijinja::{Environment, context};
use serde_json::json;
use url::Url;

use crate::github::WidgetError;
use crate::page::PageIdentity;

/// Page listing the GitHub app that must be installed on the repository.
pub const APP_INSTALL_URL: &str = "https://github.com/apps/utterances";

/// Service that exchanges GitHub OAuth codes for widget tokens.
pub const DEFAULT_AUTHORIZE_BASE: &str = "https://api.utteranc.es";

const NOT_INSTALLED_TEMPLATE: &str = "not_installed.html";
const NOT_LOGGED_IN_TEMPLATE: &str = "not_logged_in.html";
const ORIGIN_NOT_PERMITTED_TEMPLATE: &str = "origin_not_permitted.html";

const NOT_INSTALLED: &str = r#"<div class="flash flash-error">
  Error: the comments app is not installed on <code>{{ repository }}</code>.
  If you own this repo, <a href="{{ install_url }}"><strong>install the app</strong></a>.
</div>"#;

const NOT_LOGGED_IN: &str = r#"<div class="flash flash-error">
  Error: You are not logged into GitHub. You need to
  <a href="{{ login_url }}" target="_top">login</a>
  to view reactions and comments.
</div>"#;

const ORIGIN_NOT_PERMITTED: &str = r#"<div class="flash flash-error flash-not-installed">
  Error: <code>{{ origin }}</code> is not permitted to post to <code>{{ repository }}</code>.
  Confirm this is the correct repo for this site's comments. If you own this repo,
  <a href="{{ edit_url }}" target="_top"><strong>update the utterances.json</strong></a>
  to include <code>{{ origin }}</code> in the list of origins.<br/><br/>
  Suggested configuration:<br/>
  <pre><code>{{ suggested }}</code></pre>
</div>"#;

/// Which failure a banner reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// The GitHub app is missing from the repository.
    NotInstalled,
    /// The viewer has no valid GitHub session.
    NotLoggedIn,
    /// The embedding origin is not on the repository's allow-list.
    OriginNotPermitted,
}

/// Where a banner is placed relative to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPlacement {
    /// Above everything, including the timeline.
    PageTop,
    /// First entry inside the timeline.
    TimelineTop,
    /// Directly above the comment composer.
    BeforeComposer,
}

/// A rendered banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Failure being reported.
    pub kind: BannerKind,
    /// Placement within the widget.
    pub placement: BannerPlacement,
    /// Rendered HTML.
    pub html: String,
}

/// Renders banners for one page.
#[derive(Debug)]
pub struct BannerRenderer {
    env: Environment<'static>,
    authorize_base: Url,
}

impl BannerRenderer {
    /// Creates a renderer whose login links point at `authorize_base`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Template` when a built-in template fails to
    /// compile.
    pub fn new(authorize_base: Url) -> Result<Self, WidgetError> {
        let mut env = Environment::new();
        for (name, source) in [
            (NOT_INSTALLED_TEMPLATE, NOT_INSTALLED),
            (NOT_LOGGED_IN_TEMPLATE, NOT_LOGGED_IN),
            (ORIGIN_NOT_PERMITTED_TEMPLATE, ORIGIN_NOT_PERMITTED),
        ] {
            env.add_template(name, source)
                .map_err(|error| template_error(&error))?;
        }
        Ok(Self {
            env,
            authorize_base,
        })
    }

    /// Banner shown when the app is not installed on the repository.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Template` when rendering fails.
    pub fn not_installed(&self, page: &PageIdentity) -> Result<Banner, WidgetError> {
        let html = self.render(
            NOT_INSTALLED_TEMPLATE,
            context! {
                repository => page.repository_slug(),
                install_url => APP_INSTALL_URL,
            },
        )?;
        Ok(Banner {
            kind: BannerKind::NotInstalled,
            placement: BannerPlacement::TimelineTop,
            html,
        })
    }

    /// Banner shown once bootstrap finished without a viewer session.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Template` when rendering fails, or
    /// `WidgetError::InvalidUrl` when the login URL cannot be built.
    pub fn not_logged_in(&self, page: &PageIdentity) -> Result<Banner, WidgetError> {
        let html = self.render(
            NOT_LOGGED_IN_TEMPLATE,
            context! { login_url => self.login_url(page.url())?.to_string() },
        )?;
        Ok(Banner {
            kind: BannerKind::NotLoggedIn,
            placement: BannerPlacement::PageTop,
            html,
        })
    }

    /// Banner shown when the page's origin may not post to the repository.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::Template` when rendering fails.
    pub fn origin_not_permitted(&self, page: &PageIdentity) -> Result<Banner, WidgetError> {
        let suggested = serde_json::to_string_pretty(&json!({ "origins": [page.origin()] }))
            .map_err(|error| WidgetError::Template {
                message: error.to_string(),
            })?;
        let edit_url = format!(
            "https://github.com/{repository}/edit/master/utterances.json",
            repository = page.repository_slug()
        );
        let html = self.render(
            ORIGIN_NOT_PERMITTED_TEMPLATE,
            context! {
                origin => page.origin(),
                repository => page.repository_slug(),
                edit_url,
                suggested,
            },
        )?;
        Ok(Banner {
            kind: BannerKind::OriginNotPermitted,
            placement: BannerPlacement::BeforeComposer,
            html,
        })
    }

    /// Builds the login URL that redirects back to `page_url`.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::InvalidUrl` when the authorize base cannot be
    /// joined.
    pub fn login_url(&self, page_url: &Url) -> Result<Url, WidgetError> {
        let mut login = self
            .authorize_base
            .join("authorize")
            .map_err(|error| WidgetError::InvalidUrl(error.to_string()))?;
        login
            .query_pairs_mut()
            .append_pair("redirect_uri", page_url.as_str());
        Ok(login)
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, WidgetError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|error| template_error(&error))
    }
}

fn template_error(error: &minijinja::Error) -> WidgetError {
    WidgetError::Template {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use url::Url;

    use super::{BannerKind, BannerPlacement, BannerRenderer};
    use crate::github::RepositoryLocator;
    use crate::page::{IssueKey, PageIdentity};

    #[fixture]
    fn renderer() -> BannerRenderer {
        let base = Url::parse("https://auth.example").expect("base should parse");
        BannerRenderer::new(base).expect("templates should compile")
    }

    #[fixture]
    fn page() -> PageIdentity {
        let repository = RepositoryLocator::from_slug("https://api.github.com", "octo/blog")
            .expect("slug should parse");
        let url = Url::parse("https://blog.example/posts/hello").expect("url should parse");
        PageIdentity::new(repository, IssueKey::Term("posts/hello".to_owned()), url)
    }

    #[rstest]
    fn login_url_redirects_back_to_page(renderer: BannerRenderer, page: PageIdentity) {
        let login = renderer.login_url(page.url()).expect("login url should build");

        assert_eq!(
            login.as_str(),
            "https://auth.example/authorize?redirect_uri=https%3A%2F%2Fblog.example%2Fposts%2Fhello"
        );
    }

    #[rstest]
    fn not_installed_names_repository(renderer: BannerRenderer, page: PageIdentity) {
        let banner = renderer.not_installed(&page).expect("banner should render");

        assert_eq!(banner.kind, BannerKind::NotInstalled);
        assert_eq!(banner.placement, BannerPlacement::TimelineTop);
        assert!(banner.html.contains("octo"), "banner should name the owner");
        assert!(banner.html.contains("install the app"));
    }

    #[rstest]
    fn not_logged_in_sits_at_page_top(renderer: BannerRenderer, page: PageIdentity) {
        let banner = renderer.not_logged_in(&page).expect("banner should render");

        assert_eq!(banner.placement, BannerPlacement::PageTop);
        assert!(banner.html.contains("authorize?redirect_uri="));
        assert!(banner.html.contains("not logged into GitHub"));
    }

    #[rstest]
    fn origin_banner_suggests_configuration(renderer: BannerRenderer, page: PageIdentity) {
        let banner = renderer
            .origin_not_permitted(&page)
            .expect("banner should render");

        assert_eq!(banner.kind, BannerKind::OriginNotPermitted);
        assert_eq!(banner.placement, BannerPlacement::BeforeComposer);
        assert!(banner.html.contains("blog.example"), "origin should be named");
        assert!(banner.html.contains("utterances.json"));
        assert!(
            banner.html.contains("&quot;origins&quot;"),
            "suggested configuration should be escaped JSON: {}",
            banner.html
        );
    }
}
