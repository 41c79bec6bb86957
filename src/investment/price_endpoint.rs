//! Defines the endpoint for setting the current price of an investment.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    amount::is_within_limit,
    auth::UserID,
    database_id::InvestmentId,
    endpoints,
    investment::update_investment_price,
};

/// The state needed to update an investment's price.
#[derive(Debug, Clone)]
pub struct UpdatePriceState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdatePriceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for updating an investment's price.
#[derive(Debug, Deserialize)]
pub struct PriceForm {
    pub current_price: Option<Decimal>,
}

/// A route handler for updating the current price of an investment,
/// redirects to the investments view on success.
pub async fn update_price_endpoint(
    State(state): State<UpdatePriceState>,
    Extension(user_id): Extension<UserID>,
    Path(investment_id): Path<InvestmentId>,
    Form(form): Form<PriceForm>,
) -> Response {
    let Some(current_price) = form
        .current_price
        .filter(|price| !price.is_sign_negative())
    else {
        return Error::MissingFields.into_alert_response();
    };

    if !is_within_limit(current_price) {
        return Error::AmountTooLarge.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_investment_price(user_id, investment_id, current_price, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update price of investment {investment_id}: {error}");
            error.into_alert_response()
        }
    }
}
