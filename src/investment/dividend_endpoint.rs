//! Defines the endpoint for recording a dividend payment.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
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
    database_id::InvestmentId,
    endpoints,
    investment::{NewDividend, add_dividend},
};

/// The state needed to record a dividend.
#[derive(Debug, Clone)]
pub struct AddDividendState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AddDividendState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for recording a dividend.
#[derive(Debug, Deserialize)]
pub struct DividendForm {
    pub investment_id: Option<InvestmentId>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<Date>,
    /// Checkbox value, only "true" counts as reinvested.
    pub reinvested: Option<String>,
}

impl DividendForm {
    fn validate(self) -> Result<NewDividend, Error> {
        let (Some(investment_id), Some(amount), Some(payment_date)) = (
            self.investment_id,
            self.amount
                .filter(|amount| amount.is_sign_positive() && !amount.is_zero()),
            self.payment_date,
        ) else {
            return Err(Error::MissingFields);
        };

        if !is_within_limit(amount) {
            return Err(Error::AmountTooLarge);
        }

        Ok(NewDividend {
            investment_id,
            amount,
            payment_date,
            reinvested: self.reinvested.as_deref() == Some("true"),
        })
    }
}

/// A route handler for recording a dividend, redirects to the investments view on success.
pub async fn add_dividend_endpoint(
    State(state): State<AddDividendState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DividendForm>,
) -> Response {
    let new_dividend = match form.validate() {
        Ok(new_dividend) => new_dividend,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = add_dividend(user_id, new_dividend, &connection) {
        tracing::error!("could not record dividend: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
