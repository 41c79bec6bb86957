//! Defines the JSON endpoint for disconnecting an external account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, SuccessResponse, account::disconnect_external_account, auth::UserID,
    database_id::AccountId,
};

/// The state needed to disconnect an account.
#[derive(Debug, Clone)]
pub struct DisconnectAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DisconnectAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for disconnecting an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectAccountRequest {
    account_id: Option<AccountId>,
}

/// A route handler for disconnecting an account and deleting its imported
/// transactions, responds with `{"success":true}`.
///
/// A body that is not JSON or has no numeric `accountId` is a bad request.
pub async fn disconnect_account_endpoint(
    State(state): State<DisconnectAccountState>,
    Extension(user_id): Extension<UserID>,
    request: Result<Json<DisconnectAccountRequest>, JsonRejection>,
) -> Response {
    let Some(account_id) = request
        .inspect_err(|rejection| tracing::debug!("could not read disconnect request: {rejection}"))
        .ok()
        .and_then(|Json(request)| request.account_id)
    else {
        return (StatusCode::BAD_REQUEST, "Account ID is required").into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_api_response();
        }
    };

    match disconnect_external_account(user_id, account_id, &connection) {
        Ok(()) => {
            tracing::info!("disconnected account {account_id}");
            SuccessResponse { success: true }.into_response()
        }
        Err(Error::AccountNotFound) => {
            tracing::info!("account {account_id} not found for disconnect");
            Error::AccountNotFound.into_api_response()
        }
        Err(error) => {
            tracing::error!("could not disconnect account {account_id}: {error}");
            error.into_api_response()
        }
    }
}
