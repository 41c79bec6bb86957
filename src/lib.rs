//! Finboard is a web app for tracking personal finances: transactions, budgets,
//! connected accounts and investment holdings.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! handful of JSON endpoints.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod amount;
mod app_state;
mod auth;
mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod investment;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{AccountType, connect_external_account};
pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_id};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{
    alert::Alert, database_id::DatabaseId, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email and password combination that does not match a user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is not a valid address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user with the email address already exists.
    #[error("Email already registered")]
    DuplicateEmail,

    /// A form or JSON body was missing a required value.
    #[error("Missing required fields")]
    MissingFields,

    /// A budget referenced a category that does not exist.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(DatabaseId),

    /// A budget period ends before it starts.
    #[error("the end date {end} is before the start date {start}")]
    InvalidDateRange {
        /// The first day of the period.
        start: Date,
        /// The last day of the period.
        end: Date,
    },

    /// The provider ID is not in the catalogue for the account type.
    #[error("\"{0}\" is not a supported provider for this account type")]
    InvalidProvider(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist, belongs to another
    /// user, or was imported from an external account.
    #[error("Transaction not found or cannot be deleted")]
    DeleteMissingTransaction,

    /// Tried to disconnect an account that does not exist or belongs to another user.
    #[error("Account not found")]
    AccountNotFound,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update an investment that does not exist
    #[error("tried to update an investment that is not in the database")]
    UpdateMissingInvestment,

    /// An amount, share count or price was larger than the app accepts.
    #[error("amounts must be no more than {}", amount::MAX_AMOUNT)]
    AmountTooLarge,

    /// A total or product of amounts was too large to represent.
    #[error("the amounts are too large to calculate with")]
    ArithmeticOverflow,

    /// Tried to record a dividend for an investment the user does not hold.
    #[error("the investment ID {0} does not refer to one of your investments")]
    InvalidInvestment(DatabaseId),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert for HTMX requests.
    fn into_alert_response(self) -> Response {
        let (status_code, message, details) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::MissingFields => (
                StatusCode::BAD_REQUEST,
                "Missing required fields",
                "Fill in every field of the form and try again.".to_owned(),
            ),
            Error::AmountTooLarge => (
                StatusCode::BAD_REQUEST,
                "Amount too large",
                format!(
                    "Amounts, share counts and prices must be no more than {}.",
                    amount::MAX_AMOUNT
                ),
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid category",
                format!("Could not find a category with the ID {category_id}."),
            ),
            Error::InvalidDateRange { start, end } => (
                StatusCode::BAD_REQUEST,
                "Invalid date range",
                format!("The end date {end} must not be before the start date {start}."),
            ),
            Error::InvalidProvider(provider) => (
                StatusCode::BAD_REQUEST,
                "Unsupported provider",
                format!("\"{provider}\" is not supported for this account type."),
            ),
            Error::InvalidInvestment(investment_id) => (
                StatusCode::BAD_REQUEST,
                "Invalid investment",
                format!("Could not find an investment with the ID {investment_id}."),
            ),
            Error::UpdateMissingBudget => (
                StatusCode::NOT_FOUND,
                "Could not update budget",
                "The budget could not be found.".to_owned(),
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                "Could not delete budget",
                "The budget could not be found. \
                Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            ),
            Error::UpdateMissingInvestment => (
                StatusCode::NOT_FOUND,
                "Could not update investment",
                "The investment could not be found.".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not delete transaction",
                "Transaction not found or cannot be deleted.".to_owned(),
            ),
            Error::AccountNotFound => (
                StatusCode::NOT_FOUND,
                "Could not disconnect account",
                "Account not found.".to_owned(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        };

        (
            status_code,
            Alert::Error {
                message: message.to_owned(),
                details,
            },
        )
            .into_response()
    }

    /// Render the error as a plain-text body for the JSON API.
    fn into_api_response(self) -> Response {
        match self {
            Error::MissingFields => (StatusCode::BAD_REQUEST, "Missing required fields"),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Transaction not found or cannot be deleted",
            ),
            Error::AccountNotFound => (StatusCode::NOT_FOUND, "Account not found"),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
        .into_response()
    }
}

/// The JSON body returned by API endpoints that only report success.
#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
struct SuccessResponse {
    success: bool,
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
