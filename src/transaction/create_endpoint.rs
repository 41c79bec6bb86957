//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    amount::is_within_limit,
    auth::UserID,
    endpoints,
    timezone::local_today,
    transaction::{NewTransaction, TransactionType, add_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in dollars.
    pub amount: Option<Decimal>,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The name of the category.
    pub category: Option<String>,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The date when the transaction ocurred, today if omitted.
    pub date: Option<Date>,
}

impl TransactionForm {
    /// Check that every required field is present.
    ///
    /// # Errors
    /// Returns [Error::MissingFields] if the amount is missing or not positive,
    /// or if the description, category or type is missing or blank.
    /// Returns [Error::AmountTooLarge] if the amount is over the limit.
    fn validate(self) -> Result<NewTransaction, Error> {
        let non_blank = |text: Option<String>| text.filter(|text| !text.trim().is_empty());

        let (Some(amount), Some(description), Some(category), Some(kind)) = (
            self.amount.filter(|amount| amount.is_sign_positive() && !amount.is_zero()),
            non_blank(self.description),
            non_blank(self.category),
            self.kind,
        ) else {
            return Err(Error::MissingFields);
        };

        if !is_within_limit(amount) {
            return Err(Error::AmountTooLarge);
        }

        let new_transaction = NewTransaction::new(amount, description.trim(), &category, kind);

        Ok(match self.date {
            Some(date) => new_transaction.date(date),
            None => new_transaction,
        })
    }
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match form.validate() {
        Ok(new_transaction) => new_transaction,
        Err(error) => return error.into_alert_response(),
    };

    let new_transaction = match new_transaction.date {
        Some(_) => new_transaction,
        None => match local_today(&state.local_timezone) {
            Ok(today) => new_transaction.date(today),
            Err(error) => return error.into_alert_response(),
        },
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = add_transaction(user_id, new_transaction, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
