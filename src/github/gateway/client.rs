//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::WidgetError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the API base URL, authenticated when a
/// token is supplied.
///
/// # Errors
///
/// Returns `WidgetError::InvalidUrl` when the base URI cannot be parsed or
/// `WidgetError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: Option<&PersonalAccessToken>,
    api_base: &str,
) -> Result<Octocrab, WidgetError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| WidgetError::InvalidUrl(error.to_string()))?;

    let builder = match token {
        Some(value) => Octocrab::builder().personal_token(value.as_ref()),
        None => Octocrab::builder(),
    };

    builder
        .base_uri(base_uri)
        .map_err(|error| WidgetError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
