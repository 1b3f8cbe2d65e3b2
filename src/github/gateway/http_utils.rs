//! Shared HTTP utilities for the Octocrab gateway.

use http::header::{ACCEPT, HeaderMap, HeaderValue};

/// Media type that makes GitHub include rendered `body_html` on comments.
pub(super) const HTML_MEDIA_TYPE: &str = "application/vnd.github.v3.html+json";

pub(super) fn accept_headers(media_type: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(media_type));
    headers
}

pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use http::header::ACCEPT;

    use super::{HTML_MEDIA_TYPE, accept_headers, extract_github_message};

    #[test]
    fn extracts_message_from_github_error_body() {
        let body = r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#;

        assert_eq!(extract_github_message(body).as_deref(), Some("Not Found"));
    }

    #[test]
    fn ignores_non_json_bodies() {
        assert_eq!(extract_github_message("<html>502</html>"), None);
    }

    #[test]
    fn accept_header_carries_media_type() {
        let headers = accept_headers(HTML_MEDIA_TYPE);

        assert_eq!(
            headers.get(ACCEPT).and_then(|value| value.to_str().ok()),
            Some(HTML_MEDIA_TYPE)
        );
    }
}
