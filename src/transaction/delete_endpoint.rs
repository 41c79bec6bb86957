//! Defines the JSON endpoint for deleting a manually entered transaction.

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
    AppState, Error, SuccessResponse, auth::UserID, database_id::TransactionId,
    transaction::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for deleting a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionRequest {
    transaction_id: Option<TransactionId>,
}

/// A route handler for deleting a transaction, responds with `{"success":true}`.
///
/// Transactions imported from an external account cannot be deleted and
/// respond the same way as a missing transaction. A body that is not JSON or
/// has no numeric `transactionId` is a bad request.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    request: Result<Json<DeleteTransactionRequest>, JsonRejection>,
) -> Response {
    let Some(transaction_id) = request
        .inspect_err(|rejection| tracing::debug!("could not read delete request: {rejection}"))
        .ok()
        .and_then(|Json(request)| request.transaction_id)
    else {
        return (StatusCode::BAD_REQUEST, "Transaction ID is required").into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_api_response();
        }
    };

    match delete_transaction(user_id, transaction_id, &connection) {
        Ok(0) => Error::DeleteMissingTransaction.into_api_response(),
        Ok(_) => SuccessResponse { success: true }.into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_api_response()
        }
    }
}

#[cfg(test)]
mod delete_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json, Router, extract::State, http::StatusCode, response::Response,
        routing::post,
    };
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::{
        Error,
        account::{AccountType, NewExternalAccount, add_external_account},
        test_utils::{create_other_user, get_test_connection},
        transaction::{
            NewTransaction, TransactionType, add_external_transactions, add_transaction,
            get_transaction,
        },
    };

    use super::{DeleteTransactionRequest, DeleteTransactionState, delete_transaction_endpoint};

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn deletes_manual_transaction() {
        let (conn, user_id) = get_test_connection();
        let transaction = add_transaction(
            user_id,
            NewTransaction::new(dec!(4), "Coffee", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Ok(Json(DeleteTransactionRequest {
                transaction_id: Some(transaction.id),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"success":true}"#);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(user_id, transaction.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn missing_id_is_bad_request() {
        let (conn, user_id) = get_test_connection();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state),
            Extension(user_id),
            Ok(Json(DeleteTransactionRequest {
                transaction_id: None,
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Transaction ID is required");
    }

    #[tokio::test]
    async fn external_transaction_is_not_found() {
        let (conn, user_id) = get_test_connection();
        let account = add_external_account(
            user_id,
            NewExternalAccount {
                provider: "citi".to_owned(),
                kind: AccountType::Credit,
                name: "Double Cash".to_owned(),
                last_four: "9876".to_owned(),
                balance: dec!(1500),
            },
            &conn,
        )
        .unwrap();
        let imported = add_external_transactions(
            user_id,
            account.id,
            &[NewTransaction::new(dec!(25), "Spotify", "Entertainment", TransactionType::Expense)],
            &conn,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Ok(Json(DeleteTransactionRequest {
                transaction_id: Some(imported[0].id),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(response).await,
            "Transaction not found or cannot be deleted"
        );
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(user_id, imported[0].id, &connection).is_ok());
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_other_user(&conn);
        let transaction = add_transaction(
            other_user,
            NewTransaction::new(dec!(4), "Coffee", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_transaction_endpoint(
            State(state),
            Extension(user_id),
            Ok(Json(DeleteTransactionRequest {
                transaction_id: Some(transaction.id),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreadable_body_is_bad_request() {
        let (conn, user_id) = get_test_connection();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let app = Router::new()
            .route("/delete", post(delete_transaction_endpoint))
            .layer(Extension(user_id))
            .with_state(state);
        let server = TestServer::try_new(app).unwrap();

        let string_id = server
            .post("/delete")
            .json(&json!({ "transactionId": "5" }))
            .await;
        let plain_text = server.post("/delete").text("transactionId=5").await;
        let malformed = server
            .post("/delete")
            .text(r#"{"transactionId": "#)
            .content_type("application/json")
            .await;

        for response in [string_id, plain_text, malformed] {
            response.assert_status_bad_request();
            response.assert_text("Transaction ID is required");
        }
    }
}
