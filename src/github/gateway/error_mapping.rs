//! Error mapping helpers for the Octocrab gateway.

use http::StatusCode;

use crate::github::error::WidgetError;

/// Checks if a GitHub error status indicates an authentication failure.
///
/// Only 401 counts; a 403 comes from a signed-in viewer the repository
/// refuses, which a fresh sign-in would not fix.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED)
}

/// Checks whether a write was refused because the app cannot reach the
/// repository.
pub(super) fn is_not_installed(status: StatusCode, message: &str) -> bool {
    status == StatusCode::FORBIDDEN
        && message
            .to_lowercase()
            .contains("resource not accessible by integration")
}

/// Checks whether an octocrab error is an installation refusal.
pub(super) fn is_not_installed_error(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            is_not_installed(source.status_code, &source.message)
        }
        _ => false,
    }
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether a status and message describe a rate limit rejection.
pub(super) fn is_rate_limit(
    status: StatusCode,
    message: &str,
    documentation_url: Option<&str>,
) -> bool {
    let is_rate_limit_status = matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = message.to_lowercase().contains("rate limit")
        || documentation_url.is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

/// Checks whether the GitHub error represents a rate limit error.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    is_rate_limit(
        source.status_code,
        &source.message,
        source.documentation_url.as_deref(),
    )
}

/// Returns the HTTP status of a GitHub API error, if it carries one.
pub(super) const fn github_status(error: &octocrab::Error) -> Option<StatusCode> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code),
        _ => None,
    }
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> WidgetError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return map_http_error(operation, source.status_code, Some(source.message.clone()));
    }

    if is_network_error(error) {
        return WidgetError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    WidgetError::Api {
        message: format!("{operation} failed: {error}"),
    }
}

pub(super) fn map_http_error(
    operation: &str,
    status: StatusCode,
    maybe_message: Option<String>,
) -> WidgetError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());
    if is_rate_limit(status, &message, None) {
        WidgetError::RateLimitExceeded {
            rate_limit: None,
            message: format!("{operation} failed: {message}"),
        }
    } else if is_auth_failure(status) {
        WidgetError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        }
    } else {
        WidgetError::Api {
            message: format!("{operation} failed with status {status}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use rstest::rstest;

    use super::{is_not_installed, is_rate_limit, map_http_error};
    use crate::github::error::WidgetError;

    #[rstest]
    #[case::forbidden_with_message(StatusCode::FORBIDDEN, "API rate limit exceeded", None, true)]
    #[case::too_many_requests(StatusCode::TOO_MANY_REQUESTS, "Rate limit hit", None, true)]
    #[case::documentation_url(
        StatusCode::FORBIDDEN,
        "slow down",
        Some("https://docs.github.com/rest/rate-limit"),
        true
    )]
    #[case::plain_forbidden(StatusCode::FORBIDDEN, "Resource not accessible", None, false)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "rate limit", None, false)]
    fn detects_rate_limit_rejections(
        #[case] status: StatusCode,
        #[case] message: &str,
        #[case] documentation_url: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_rate_limit(status, message, documentation_url), expected);
    }

    #[test]
    fn unauthorised_status_maps_to_authentication() {
        let error = map_http_error(
            "load user",
            StatusCode::UNAUTHORIZED,
            Some("Bad credentials".to_owned()),
        );

        assert!(
            matches!(error, WidgetError::Authentication { ref message } if message.contains("Bad credentials")),
            "expected Authentication, got {error:?}"
        );
    }

    #[rstest]
    #[case::integration_refused(
        StatusCode::FORBIDDEN,
        "Resource not accessible by integration",
        true
    )]
    #[case::other_forbidden(StatusCode::FORBIDDEN, "Must have admin rights", false)]
    #[case::unauthorised(
        StatusCode::UNAUTHORIZED,
        "Resource not accessible by integration",
        false
    )]
    fn detects_installation_refusals(
        #[case] status: StatusCode,
        #[case] message: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_not_installed(status, message), expected);
    }

    #[test]
    fn forbidden_without_rate_limit_is_not_an_authentication_failure() {
        let error = map_http_error(
            "post comment",
            StatusCode::FORBIDDEN,
            Some("Must have admin rights".to_owned()),
        );

        assert!(
            matches!(error, WidgetError::Api { .. }),
            "expected Api, got {error:?}"
        );
        assert!(error.signal().is_none(), "a 403 must not ask for sign-in");
    }

    #[test]
    fn missing_message_falls_back_to_unknown_error() {
        let error = map_http_error("comments page", StatusCode::BAD_GATEWAY, None);

        assert_eq!(
            error,
            WidgetError::Api {
                message: "comments page failed with status 502 Bad Gateway: unknown error"
                    .to_owned(),
            }
        );
    }
}
