//! Defines the budget model and the database queries for budgets.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::{BudgetId, CategoryId},
    db::get_decimal,
};

// ============================================================================
// MODELS
// ============================================================================

/// How often a budget repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Annual,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Annual => "annual",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "annual" => Ok(BudgetPeriod::Annual),
            other => Err(format!("unknown budget period \"{other}\"")),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A spending limit for one category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    /// The name of the budget's category, which transactions are matched on.
    pub category_name: String,
    /// The most the user wants to spend in the period.
    pub amount: Decimal,
    pub period: BudgetPeriod,
    /// The first day of the budget, inclusive.
    pub start_date: Date,
    /// The last day of the budget, inclusive.
    pub end_date: Date,
}

/// The data needed to create a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: Date,
    pub end_date: Date,
}

/// The fields of a budget to change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub category_id: Option<CategoryId>,
    pub amount: Option<Decimal>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl BudgetUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &BudgetUpdate::default()
    }
}

fn check_date_range(start: Date, end: Date) -> Result<(), Error> {
    if end < start {
        return Err(Error::InvalidDateRange { start, end });
    }

    Ok(())
}

fn map_category_error(category_id: CategoryId) -> impl FnOnce(rusqlite::Error) -> Error {
    move |error| match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(category_id),
        error => error.into(),
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                period TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user ON budget(user_id);",
        (),
    )?;

    Ok(())
}

const SELECT_BUDGET: &str = "SELECT budget.id, budget.user_id, budget.category_id, category.name,
    budget.amount, budget.period, budget.start_date, budget.end_date
    FROM budget INNER JOIN category ON category.id = budget.category_id";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        amount: get_decimal(row, 4)?,
        period: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
    })
}

/// Create a budget for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDateRange] if the end date is before the start date,
/// - [Error::InvalidCategory] if `category_id` does not refer to a category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_budget(
    user_id: UserID,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    check_date_range(new_budget.start_date, new_budget.end_date)?;

    let id: BudgetId = connection
        .query_row(
            "INSERT INTO budget (user_id, category_id, amount, period, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id",
            (
                user_id.as_i64(),
                new_budget.category_id,
                new_budget.amount.to_string(),
                new_budget.period,
                new_budget.start_date,
                new_budget.end_date,
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )
        .map_err(map_category_error(new_budget.category_id))?;

    get_budget(user_id, id, connection)
}

/// Get one of the user's budgets.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a budget owned by `user_id`.
pub fn get_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE budget.id = ?1 AND budget.user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)
        .map_err(Error::from)
}

/// Get all of the user's budgets with their category names.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE budget.user_id = ?1 ORDER BY budget.start_date DESC, budget.id DESC"
        ))?
        .query_map([user_id.as_i64()], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Change the fields of one of the user's budgets that are set in `update`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - [Error::InvalidDateRange] if the updated end date is before the updated start date,
/// - [Error::InvalidCategory] if the new category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    user_id: UserID,
    id: BudgetId,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    let existing = get_budget(user_id, id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingBudget,
        error => error,
    })?;

    let category_id = update.category_id.unwrap_or(existing.category_id);
    let amount = update.amount.unwrap_or(existing.amount);
    let period = update.period.unwrap_or(existing.period);
    let start_date = update.start_date.unwrap_or(existing.start_date);
    let end_date = update.end_date.unwrap_or(existing.end_date);

    check_date_range(start_date, end_date)?;

    connection
        .execute(
            "UPDATE budget
            SET category_id = ?1, amount = ?2, period = ?3, start_date = ?4, end_date = ?5
            WHERE id = ?6 AND user_id = ?7",
            (
                category_id,
                amount.to_string(),
                period,
                start_date,
                end_date,
                id,
                user_id.as_i64(),
            ),
        )
        .map_err(map_category_error(category_id))?;

    get_budget(user_id, id, connection)
}

/// Delete one of the user's budgets.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}
