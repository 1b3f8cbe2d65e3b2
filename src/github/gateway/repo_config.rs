//! Decoding of the repository's origin allow-list file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::github::error::WidgetError;
use crate::github::models::{ApiContent, RepoConfig};

/// Decodes a contents API response into a [`RepoConfig`].
///
/// A file without an `origins` array permits nothing; the gate then reports
/// the suggested configuration to the repository owner.
pub(super) fn decode_repo_config(content: &ApiContent) -> Result<RepoConfig, WidgetError> {
    let raw = content.content.as_deref().unwrap_or_default();
    let text = match content.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|error| config_error(&format!("invalid base64: {error}")))?;
            String::from_utf8(bytes).map_err(|error| config_error(&error.to_string()))?
        }
        _ => raw.to_owned(),
    };

    parse_repo_config(&text)
}

pub(super) fn parse_repo_config(text: &str) -> Result<RepoConfig, WidgetError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|error| config_error(&error.to_string()))?;

    let origins = value
        .get("origins")
        .and_then(serde_json::Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(RepoConfig::from_origins(origins))
}

fn config_error(detail: &str) -> WidgetError {
    WidgetError::Api {
        message: format!("repository config is unreadable: {detail}"),
    }
}
