//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for displaying budgets and how much of each has been spent.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for displaying investment holdings.
pub const INVESTMENTS_VIEW: &str = "/investments";
/// The page for displaying and connecting external accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for registering a user from the registration form.
pub const USERS: &str = "/api/users";
/// The JSON route for registering a user.
pub const REGISTER_API: &str = "/api/auth/register";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The JSON route to delete a transaction.
pub const DELETE_TRANSACTION_API: &str = "/api/transactions/delete";
/// The route to create a budget.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to update or delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to add an investment.
pub const INVESTMENTS_API: &str = "/api/investments";
/// The route to update the current price of an investment.
pub const INVESTMENT_PRICE: &str = "/api/investments/{investment_id}/price";
/// The route to record a dividend payment.
pub const DIVIDENDS_API: &str = "/api/dividends";
/// The route to connect an external account.
pub const CONNECT_ACCOUNT_API: &str = "/api/accounts/connect";
/// The JSON route to disconnect an external account.
pub const DISCONNECT_ACCOUNT_API: &str = "/api/accounts/disconnect";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::INVESTMENTS_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::REGISTER_API,
            endpoints::TRANSACTIONS_API,
            endpoints::DELETE_TRANSACTION_API,
            endpoints::BUDGETS_API,
            endpoints::BUDGET,
            endpoints::INVESTMENTS_API,
            endpoints::INVESTMENT_PRICE,
            endpoints::DIVIDENDS_API,
            endpoints::CONNECT_ACCOUNT_API,
            endpoints::DISCONNECT_ACCOUNT_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::BUDGET, 1);

        assert_eq!(formatted_path, "/api/budgets/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::INVESTMENT_PRICE, 12);

        assert_eq!(formatted_path, "/api/investments/12/price");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
