//! Defines the endpoint for connecting an external account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rand::{SeedableRng, rngs::StdRng};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{AccountType, connect_external_account},
    auth::UserID,
    endpoints,
    timezone::local_today,
};

/// The state needed to connect an account.
#[derive(Debug, Clone)]
pub struct ConnectAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for ConnectAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for connecting an account.
#[derive(Debug, Deserialize)]
pub struct ConnectAccountForm {
    #[serde(rename = "type")]
    pub kind: Option<AccountType>,
    pub provider: Option<String>,
    /// The name of the account product, e.g. "Sapphire Reserve".
    pub account: Option<String>,
}

/// A route handler for connecting an external account, redirects to the
/// accounts view on success.
pub async fn connect_account_endpoint(
    State(state): State<ConnectAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ConnectAccountForm>,
) -> Response {
    let non_blank = |text: Option<String>| {
        text.map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
    };

    let (Some(kind), Some(provider), Some(account_name)) =
        (form.kind, non_blank(form.provider), non_blank(form.account))
    else {
        return Error::MissingFields.into_alert_response();
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let mut rng = StdRng::from_entropy();

    match connect_external_account(
        user_id,
        kind,
        &provider,
        &account_name,
        today,
        &mut rng,
        &connection,
    ) {
        Ok(account) => {
            tracing::info!("connected {kind} account {} at {provider}", account.id);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not connect {kind} account at {provider}: {error}");
            error.into_alert_response()
        }
    }
}
