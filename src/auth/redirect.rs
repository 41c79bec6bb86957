//! Builds the log-in URL that sends a user back to where they were once they
//! have signed in.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

/// Only same-site paths are allowed, and never the log-in page itself.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != endpoints::REGISTER_VIEW
}

/// Reduce `raw_url` to a safe, relative path and query.
///
/// Returns `None` for absolute URLs and unsafe paths.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The HX-Current-URL header holds an absolute URL, so only the path is kept.
fn normalize_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Build the log-in URL for `request`, falling back to the dashboard if the
/// request does not say where the user was.
pub fn log_in_redirect_url(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)
    } else {
        let target = request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()));
        if target.is_none() {
            warn!("Invalid redirect URL from request URI. Falling back to dashboard.");
        }
        target
    };

    target
        .as_deref()
        .and_then(build_log_in_redirect_url_from_target)
        .or_else(|| build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW))
        .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
}

fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        warn!("Missing HX-Request header for /api request. Falling back to dashboard.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        warn!("Missing HX-Current-URL header for /api request. Falling back to dashboard.");
        return None;
    };

    let redirect_url = normalize_hx_current_url(current_url);
    if redirect_url.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, http::Request};

    use crate::endpoints;

    use super::{log_in_redirect_url, normalize_redirect_url};

    fn expected_url(target: &str) -> String {
        format!(
            "{}?{}",
            endpoints::LOG_IN_VIEW,
            serde_urlencoded::to_string([("redirect_url", target)]).unwrap()
        )
    }

    #[test]
    fn rejects_absolute_and_protocol_relative_urls() {
        assert_eq!(normalize_redirect_url("https://evil.example/steal"), None);
        assert_eq!(normalize_redirect_url("//evil.example/steal"), None);
    }

    #[test]
    fn rejects_log_in_page() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }

    #[test]
    fn keeps_query_string() {
        assert_eq!(
            normalize_redirect_url("/budgets?period=monthly"),
            Some("/budgets?period=monthly".to_owned())
        );
    }

    #[test]
    fn page_request_redirects_back_to_page() {
        let request = Request::get(endpoints::INVESTMENTS_VIEW)
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            log_in_redirect_url(&request),
            expected_url(endpoints::INVESTMENTS_VIEW)
        );
    }

    #[test]
    fn hx_request_redirects_back_to_current_url() {
        let request = Request::post(endpoints::BUDGETS_API)
            .header("HX-Request", "true")
            .header("HX-Current-URL", "https://localhost:3000/budgets")
            .body(Body::empty())
            .unwrap();

        assert_eq!(log_in_redirect_url(&request), expected_url("/budgets"));
    }

    #[test]
    fn api_request_without_htmx_headers_falls_back_to_dashboard() {
        let request = Request::post(endpoints::BUDGETS_API)
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            log_in_redirect_url(&request),
            expected_url(endpoints::DASHBOARD_VIEW)
        );
    }
}
