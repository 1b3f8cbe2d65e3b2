//! Viewer token acquisition.

use async_trait::async_trait;

use crate::github::{PersonalAccessToken, WidgetError};

/// Supplies the viewer's GitHub token, if any.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns the token, or `None` for anonymous viewing.
    async fn load_token(&self) -> Result<Option<PersonalAccessToken>, WidgetError>;
}

/// Token taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredTokenSource {
    token: Option<String>,
}

impl ConfiguredTokenSource {
    /// Wraps an optional raw token.
    #[must_use]
    pub const fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for ConfiguredTokenSource {
    async fn load_token(&self) -> Result<Option<PersonalAccessToken>, WidgetError> {
        match self.token.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => PersonalAccessToken::new(raw).map(Some),
        }
    }
}
