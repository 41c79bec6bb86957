//! Defines the endpoint for adding an investment by hand.

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

use crate::{
    AppState, Error,
    amount::is_within_limit,
    auth::UserID,
    endpoints,
    investment::{InvestmentType, NewInvestment, add_investment},
};

/// The state needed to add an investment.
#[derive(Debug, Clone)]
pub struct CreateInvestmentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateInvestmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for adding an investment.
#[derive(Debug, Deserialize)]
pub struct InvestmentForm {
    pub symbol: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<InvestmentType>,
    pub shares: Option<Decimal>,
    pub average_cost: Option<Decimal>,
    pub current_price: Option<Decimal>,
}

impl InvestmentForm {
    fn validate(self) -> Result<NewInvestment, Error> {
        let non_blank = |text: Option<String>| {
            text.map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
        };
        let non_negative =
            |number: Option<Decimal>| number.filter(|number| !number.is_sign_negative());

        let (
            Some(symbol),
            Some(name),
            Some(kind),
            Some(shares),
            Some(average_cost),
            Some(current_price),
        ) = (
            non_blank(self.symbol),
            non_blank(self.name),
            self.kind,
            non_negative(self.shares),
            non_negative(self.average_cost),
            non_negative(self.current_price),
        )
        else {
            return Err(Error::MissingFields);
        };

        if ![shares, average_cost, current_price]
            .into_iter()
            .all(is_within_limit)
        {
            return Err(Error::AmountTooLarge);
        }

        Ok(NewInvestment {
            symbol: symbol.to_uppercase(),
            name,
            kind,
            shares,
            average_cost,
            current_price,
        })
    }
}

/// A route handler for adding an investment, redirects to the investments view on success.
pub async fn create_investment_endpoint(
    State(state): State<CreateInvestmentState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<InvestmentForm>,
) -> Response {
    let new_investment = match form.validate() {
        Ok(new_investment) => new_investment,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = add_investment(user_id, new_investment, &connection) {
        tracing::error!("could not create investment: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
