//! Defines the endpoint for creating a new budget.

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
    budget::{BudgetPeriod, NewBudget, add_budget},
    database_id::CategoryId,
    endpoints,
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub category_id: Option<CategoryId>,
    pub amount: Option<Decimal>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl BudgetForm {
    fn validate(self) -> Result<NewBudget, Error> {
        let (Some(category_id), Some(amount), Some(period), Some(start_date), Some(end_date)) = (
            self.category_id,
            self.amount.filter(|amount| !amount.is_sign_negative()),
            self.period,
            self.start_date,
            self.end_date,
        ) else {
            return Err(Error::MissingFields);
        };

        if !is_within_limit(amount) {
            return Err(Error::AmountTooLarge);
        }

        Ok(NewBudget {
            category_id,
            amount,
            period,
            start_date,
            end_date,
        })
    }
}

/// A route handler for creating a new budget, redirects to the budgets view on success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let new_budget = match form.validate() {
        Ok(new_budget) => new_budget,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = add_budget(user_id, new_budget, &connection) {
        tracing::error!("could not create budget: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod create_budget_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        budget::{BudgetPeriod, get_user_budgets},
        category::get_category_by_name,
        endpoints,
        test_utils::{assert_hx_redirect, get_test_connection},
    };

    use super::{BudgetForm, CreateBudgetState, create_budget_endpoint};

    fn form(category_id: i64) -> BudgetForm {
        BudgetForm {
            category_id: Some(category_id),
            amount: Some(dec!(300)),
            period: Some(BudgetPeriod::Monthly),
            start_date: Some(date!(2025 - 03 - 01)),
            end_date: Some(date!(2025 - 03 - 31)),
        }
    }

    #[tokio::test]
    async fn can_create_budget() {
        let (conn, user_id) = get_test_connection();
        let food = get_category_by_name("Food", &conn).unwrap();
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            create_budget_endpoint(State(state.clone()), Extension(user_id), Form(form(food.id)))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BUDGETS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let budgets = get_user_budgets(user_id, &connection).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category_name, "Food");
        assert_eq!(budgets[0].amount, dec!(300));
    }

    #[tokio::test]
    async fn rejects_missing_fields() {
        let (conn, user_id) = get_test_connection();
        let food = get_category_by_name("Food", &conn).unwrap();
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = BudgetForm {
            end_date: None,
            ..form(food.id)
        };

        let response =
            create_budget_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_budgets(user_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_reversed_dates() {
        let (conn, user_id) = get_test_connection();
        let food = get_category_by_name("Food", &conn).unwrap();
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = BudgetForm {
            start_date: Some(date!(2025 - 04 - 01)),
            ..form(food.id)
        };

        let response = create_budget_endpoint(State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let (conn, user_id) = get_test_connection();
        let state = CreateBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            create_budget_endpoint(State(state), Extension(user_id), Form(form(999_999))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
