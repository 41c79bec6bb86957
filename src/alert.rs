//! Success and error messages shown to users after HTMX requests.
//!
//! Alerts are rendered as an out-of-band swap into the `#alert-container`
//! element that [crate::html::base] adds to every page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable message box.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something the user asked for worked.
    Success { message: String, details: String },
    /// Something the user asked for failed.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details, container_style, icon) = match self {
            Alert::Success { message, details } => (
                message,
                details,
                "text-green-800 border-green-300 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                "✓",
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "text-red-800 border-red-300 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                "!",
            ),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class={ "flex items-start p-4 mb-4 border rounded-lg " (container_style) }
                {
                    span class="shrink-0 me-3 font-bold" { (icon) }

                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        class="ms-3 -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center justify-center h-8 w-8"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::test_utils::{assert_valid_html, parse_html_fragment};

    use super::Alert;

    #[tokio::test]
    async fn error_alert_swaps_into_alert_container() {
        let response = (
            StatusCode::NOT_FOUND,
            Alert::Error {
                message: "Could not delete budget".to_owned(),
                details: "The budget could not be found.".to_owned(),
            },
        )
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let fragment = parse_html_fragment(response).await;
        assert_valid_html(&fragment);

        let container = fragment
            .select(&scraper::Selector::parse("#alert-container").unwrap())
            .next()
            .expect("alert container missing");
        assert_eq!(container.value().attr("hx-swap-oob"), Some("true"));

        let text = container.text().collect::<String>();
        assert!(text.contains("Could not delete budget"));
        assert!(text.contains("The budget could not be found."));
    }

    #[tokio::test]
    async fn success_alert_without_details_has_one_paragraph() {
        let response = Alert::Success {
            message: "Budget created".to_owned(),
            details: String::new(),
        }
        .into_response();

        let fragment = parse_html_fragment(response).await;
        let paragraphs = fragment
            .select(&scraper::Selector::parse("p").unwrap())
            .count();

        assert_eq!(paragraphs, 1);
    }
}
