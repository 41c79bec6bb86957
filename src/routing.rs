//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{connect_account_endpoint, disconnect_account_endpoint, get_accounts_page},
    auth::{
        auth_guard, auth_guard_api, auth_guard_hx, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user, register_user_api,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint, get_budgets_page,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    investment::{
        add_dividend_endpoint, create_investment_endpoint, get_investments_page,
        update_price_endpoint,
    },
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_create_transaction_page,
        get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::REGISTER_API, post(register_user_api))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::INVESTMENTS_VIEW, get(get_investments_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(endpoints::BUDGETS_API, post(create_budget_endpoint))
            .route(
                endpoints::BUDGET,
                put(edit_budget_endpoint).delete(delete_budget_endpoint),
            )
            .route(endpoints::INVESTMENTS_API, post(create_investment_endpoint))
            .route(endpoints::INVESTMENT_PRICE, post(update_price_endpoint))
            .route(endpoints::DIVIDENDS_API, post(add_dividend_endpoint))
            .route(
                endpoints::CONNECT_ACCOUNT_API,
                post(connect_account_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    // JSON routes answer unauthenticated requests with a 401 instead of a redirect.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::DELETE_TRANSACTION_API,
                post(delete_transaction_endpoint),
            )
            .route(
                endpoints::DISCONNECT_ACCOUNT_API,
                post(disconnect_account_endpoint),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard_api,
            )),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{AppState, endpoints};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "nafstenoas",
            "Etc/UTC",
        )
        .unwrap();

        TestServer::try_new(build_router(state)).unwrap()
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_session() {
        let server = get_test_server();

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::INVESTMENTS_VIEW,
            endpoints::ACCOUNTS_VIEW,
        ] {
            let response = server.get(page).await;

            assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "{page}");
            let location = response.header("location");
            let location = location.to_str().unwrap();
            assert!(location.starts_with(endpoints::LOG_IN_VIEW), "{location}");
        }
    }

    #[tokio::test]
    async fn json_routes_are_unauthorized_without_session() {
        let server = get_test_server();

        for route in [
            endpoints::DELETE_TRANSACTION_API,
            endpoints::DISCONNECT_ACCOUNT_API,
        ] {
            let response = server
                .post(route)
                .json(&json!({ "id": 1 }))
                .expect_failure()
                .await;

            response.assert_status_unauthorized();
        }
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/not-a-page")
            .expect_failure()
            .await
            .assert_status_not_found();
    }
}
