//! Defines the endpoint for changing a budget.

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
use time::Date;

use crate::{
    AppState, Error,
    amount::is_within_limit,
    auth::UserID,
    budget::{BudgetPeriod, BudgetUpdate, update_budget},
    database_id::{BudgetId, CategoryId},
    endpoints,
};

/// The state needed to edit a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a budget. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct EditBudgetForm {
    pub category_id: Option<CategoryId>,
    pub amount: Option<Decimal>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl From<EditBudgetForm> for BudgetUpdate {
    fn from(form: EditBudgetForm) -> Self {
        Self {
            category_id: form.category_id,
            amount: form.amount,
            period: form.period,
            start_date: form.start_date,
            end_date: form.end_date,
        }
    }
}

/// A route handler for updating a budget, redirects to the budgets view on success.
pub async fn edit_budget_endpoint(
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Form(form): Form<EditBudgetForm>,
) -> Response {
    if form.amount.is_some_and(|amount| amount.is_sign_negative()) {
        return Error::MissingFields.into_alert_response();
    }

    if form.amount.is_some_and(|amount| !is_within_limit(amount)) {
        return Error::AmountTooLarge.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = update_budget(user_id, budget_id, form.into(), &connection) {
        tracing::error!("could not update budget {budget_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod edit_budget_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        budget::{BudgetPeriod, NewBudget, add_budget, get_budget},
        category::get_category_by_name,
        endpoints,
        test_utils::{assert_hx_redirect, create_other_user, get_test_connection},
    };

    use super::{EditBudgetForm, EditBudgetState, edit_budget_endpoint};

    fn new_budget(category_id: i64) -> NewBudget {
        NewBudget {
            category_id,
            amount: dec!(100),
            period: BudgetPeriod::Monthly,
            start_date: date!(2025 - 03 - 01),
            end_date: date!(2025 - 03 - 31),
        }
    }

    #[tokio::test]
    async fn updates_only_given_fields() {
        let (conn, user_id) = get_test_connection();
        let food = get_category_by_name("Food", &conn).unwrap();
        let budget = add_budget(user_id, new_budget(food.id), &conn).unwrap();
        let state = EditBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = EditBudgetForm {
            amount: Some(dec!(150)),
            ..Default::default()
        };

        let response = edit_budget_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(budget.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BUDGETS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_budget(user_id, budget.id, &connection).unwrap();
        assert_eq!(updated.amount, dec!(150));
        assert_eq!(updated.start_date, budget.start_date);
        assert_eq!(updated.category_id, food.id);
    }

    #[tokio::test]
    async fn cannot_update_other_users_budget() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_other_user(&conn);
        let food = get_category_by_name("Food", &conn).unwrap();
        let budget = add_budget(other_user, new_budget(food.id), &conn).unwrap();
        let state = EditBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = EditBudgetForm {
            amount: Some(dec!(1)),
            ..Default::default()
        };

        let response = edit_budget_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(budget.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_budget(other_user, budget.id, &connection).unwrap();
        assert_eq!(unchanged.amount, dec!(100));
    }
}
