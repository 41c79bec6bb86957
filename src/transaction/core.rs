//! Defines the core data models and database queries for transactions.

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
    database_id::{AccountId, TransactionId},
    db::get_decimal,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Give `amount` the sign for this type: negative for expenses, positive for income.
    pub fn signed_amount(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount.abs(),
            TransactionType::Expense => -amount.abs(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The external account the transaction was imported from, if any.
    pub account_id: Option<AccountId>,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: Decimal,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The name of the category the transaction belongs to.
    pub category: String,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction was imported from an external account.
    ///
    /// External transactions cannot be deleted individually.
    pub is_external: bool,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

/// The data needed to record a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The amount of money. The sign is taken from `kind` when the transaction is stored.
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub kind: TransactionType,
    /// When the transaction happened, today if `None`.
    pub date: Option<Date>,
}

impl NewTransaction {
    /// Start a new transaction dated today.
    pub fn new(amount: Decimal, description: &str, category: &str, kind: TransactionType) -> Self {
        Self {
            amount,
            description: description.to_owned(),
            category: category.to_owned(),
            kind,
            date: None,
        }
    }

    /// Set the date the transaction happened.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER,
                amount TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                type TEXT NOT NULL,
                date TEXT NOT NULL,
                is_external INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES external_account(id) ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id);",
        (),
    )?;

    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, account_id, amount, description, category, \
    type, date, is_external, created_at FROM \"transaction\"";

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        account_id: row.get(2)?,
        amount: get_decimal(row, 3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        kind: row.get(6)?,
        date: row.get(7)?,
        is_external: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn insert_transaction(
    user_id: UserID,
    account_id: Option<AccountId>,
    new_transaction: &NewTransaction,
    is_external: bool,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let date = new_transaction
        .date
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let amount = new_transaction.kind.signed_amount(new_transaction.amount);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (user_id, account_id, amount, description, category, type, date, is_external, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING id, user_id, account_id, amount, description, category, type, date, is_external, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                account_id,
                amount.to_string(),
                &new_transaction.description,
                &new_transaction.category,
                new_transaction.kind,
                date,
                is_external,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Record a manually entered transaction for `user_id`.
///
/// Expense amounts are stored as negative numbers and income amounts as
/// positive numbers, whatever sign the caller gave.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn add_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    insert_transaction(user_id, None, &new_transaction, false, connection)
}

/// Store the transactions imported from an external account.
///
/// Either all of the transactions are stored or none of them are.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, e.g. `account_id` does not exist.
pub fn add_external_transactions(
    user_id: UserID,
    account_id: AccountId,
    transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let inserted =
        insert_external_transactions(user_id, account_id, transactions, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(inserted)
}

/// Insert imported transactions without opening an SQL transaction.
///
/// Callers that already hold an open SQL transaction use this, since SQLite
/// transactions cannot be nested.
pub(crate) fn insert_external_transactions(
    user_id: UserID,
    account_id: AccountId,
    transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    transactions
        .iter()
        .map(|new_transaction| {
            insert_transaction(user_id, Some(account_id), new_transaction, true, connection)
        })
        .collect()
}

/// Get all of a user's transactions, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the transactions imported from one of the user's external accounts, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_account_transactions(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id AND account_id = :account_id
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            &[
                (":user_id", &user_id.as_i64()),
                (":account_id", &account_id),
            ],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!("{SELECT_COLUMNS} WHERE id = :id AND user_id = :user_id"))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete one of the user's manually entered transactions.
///
/// Returns the number of rows deleted. Zero means the transaction does not
/// exist, belongs to another user or was imported from an external account.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2 AND is_external = 0",
            (id, user_id.as_i64()),
        )
        .map_err(Error::from)
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rust_decimal_macros::dec;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        account::{AccountType, NewExternalAccount, add_external_account},
        test_utils::{create_other_user, get_test_connection},
    };

    use super::{
        NewTransaction, TransactionType, add_external_transactions, add_transaction,
        delete_transaction, get_account_transactions, get_transaction, get_user_transactions,
    };

    #[test]
    fn add_expense_stores_negative_amount() {
        let (conn, user_id) = get_test_connection();

        let transaction = add_transaction(
            user_id,
            NewTransaction::new(dec!(40), "Groceries run", "Food", TransactionType::Expense)
                .date(date!(2025 - 03 - 02)),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, dec!(-40));
        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.date, date!(2025 - 03 - 02));
        assert!(!transaction.is_external);
        assert_eq!(transaction.account_id, None);
    }

    #[test]
    fn add_income_stores_positive_amount() {
        let (conn, user_id) = get_test_connection();

        let transaction = add_transaction(
            user_id,
            NewTransaction::new(dec!(-100), "Pay", "Salary", TransactionType::Income),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, dec!(100));
    }

    #[test]
    fn add_without_date_defaults_to_today() {
        let (conn, user_id) = get_test_connection();

        let transaction = add_transaction(
            user_id,
            NewTransaction::new(dec!(1), "Gum", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.date, OffsetDateTime::now_utc().date());
    }

    #[test]
    fn get_user_transactions_is_newest_first_and_scoped_by_user() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_other_user(&conn);
        for (day, description) in [(1, "first"), (3, "third"), (2, "second")] {
            add_transaction(
                user_id,
                NewTransaction::new(dec!(5), description, "Food", TransactionType::Expense)
                    .date(date!(2025 - 01 - 01).replace_day(day).unwrap()),
                &conn,
            )
            .unwrap();
        }
        add_transaction(
            other_user,
            NewTransaction::new(dec!(5), "not mine", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        let transactions = get_user_transactions(user_id, &conn).unwrap();

        let descriptions: Vec<_> = transactions
            .iter()
            .map(|transaction| transaction.description.as_str())
            .collect();
        assert_eq!(descriptions, ["third", "second", "first"]);
    }

    #[test]
    fn get_transaction_of_other_user_is_not_found() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_other_user(&conn);
        let transaction = add_transaction(
            other_user,
            NewTransaction::new(dec!(5), "not mine", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_manual_transaction_succeeds() {
        let (conn, user_id) = get_test_connection();
        let transaction = add_transaction(
            user_id,
            NewTransaction::new(dec!(5), "Coffee", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(user_id, transaction.id, &conn), Ok(1));
        assert_eq!(
            get_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_other_users_transaction_deletes_nothing() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_other_user(&conn);
        let transaction = add_transaction(
            other_user,
            NewTransaction::new(dec!(5), "Coffee", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(user_id, transaction.id, &conn), Ok(0));
        assert!(get_transaction(other_user, transaction.id, &conn).is_ok());
    }

    #[test]
    fn external_transactions_cannot_be_deleted() {
        let (conn, user_id) = get_test_connection();
        let account = add_external_account(
            user_id,
            NewExternalAccount {
                provider: "chase".to_owned(),
                kind: AccountType::Bank,
                name: "Checking".to_owned(),
                last_four: "1234".to_owned(),
                balance: dec!(5000),
            },
            &conn,
        )
        .unwrap();
        let inserted = add_external_transactions(
            user_id,
            account.id,
            &[NewTransaction::new(
                dec!(100),
                "ATM Withdrawal",
                "ATM Withdrawal",
                TransactionType::Expense,
            )
            .date(date!(2025 - 02 - 01))],
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(user_id, inserted[0].id, &conn), Ok(0));
        assert!(inserted[0].is_external);
        assert_eq!(inserted[0].amount, dec!(-100));
    }

    #[test]
    fn get_account_transactions_only_returns_that_account() {
        let (conn, user_id) = get_test_connection();
        let account = add_external_account(
            user_id,
            NewExternalAccount {
                provider: "amex".to_owned(),
                kind: AccountType::Credit,
                name: "Gold Card".to_owned(),
                last_four: "4321".to_owned(),
                balance: dec!(2000),
            },
            &conn,
        )
        .unwrap();
        add_external_transactions(
            user_id,
            account.id,
            &[
                NewTransaction::new(dec!(20), "Uber", "Travel & Transportation", TransactionType::Expense)
                    .date(date!(2025 - 02 - 01)),
                NewTransaction::new(dec!(30), "Netflix", "Entertainment", TransactionType::Expense)
                    .date(date!(2025 - 02 - 03)),
            ],
            &conn,
        )
        .unwrap();
        add_transaction(
            user_id,
            NewTransaction::new(dec!(5), "Coffee", "Food", TransactionType::Expense),
            &conn,
        )
        .unwrap();

        let transactions = get_account_transactions(user_id, account.id, &conn).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].description, "Netflix");
        assert!(transactions.iter().all(|t| t.account_id == Some(account.id)));
    }
}
