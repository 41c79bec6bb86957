//! Categories group transactions and budgets, e.g., 'Groceries', 'Salary'.
//!
//! Every category is either for income or for expenses. Categories are shared
//! by all users and are seeded the first time the database is initialized.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId, transaction::TransactionType};

/// A category for expenses or income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The id of the category.
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub kind: TransactionType,
}

/// The categories offered to every new installation.
const DEFAULT_CATEGORIES: [(&str, TransactionType); 14] = [
    ("Salary", TransactionType::Income),
    ("Freelance", TransactionType::Income),
    ("Investments", TransactionType::Income),
    ("Other Income", TransactionType::Income),
    ("Housing", TransactionType::Expense),
    ("Transportation", TransactionType::Expense),
    ("Food", TransactionType::Expense),
    ("Utilities", TransactionType::Expense),
    ("Healthcare", TransactionType::Expense),
    ("Entertainment", TransactionType::Expense),
    ("Shopping", TransactionType::Expense),
    ("Education", TransactionType::Expense),
    ("Savings", TransactionType::Expense),
    ("Other Expenses", TransactionType::Expense),
];

/// The categories used by transactions imported from external accounts.
const EXTENDED_CATEGORIES: [(&str, TransactionType); 26] = [
    ("Dining & Restaurants", TransactionType::Expense),
    ("Travel & Transportation", TransactionType::Expense),
    ("Groceries", TransactionType::Expense),
    ("Shopping & Retail", TransactionType::Expense),
    ("Entertainment", TransactionType::Expense),
    ("Bills & Utilities", TransactionType::Expense),
    ("Health & Wellness", TransactionType::Expense),
    ("Auto & Transport", TransactionType::Expense),
    ("Home & Garden", TransactionType::Expense),
    ("Education", TransactionType::Expense),
    ("Direct Deposit", TransactionType::Income),
    ("Interest Income", TransactionType::Income),
    ("Transfers", TransactionType::Income),
    ("Refunds", TransactionType::Income),
    ("ATM Withdrawal", TransactionType::Expense),
    ("Bank Fees", TransactionType::Expense),
    ("Mortgage/Rent", TransactionType::Expense),
    ("Insurance", TransactionType::Expense),
    ("Dividend Income", TransactionType::Income),
    ("Capital Gains", TransactionType::Income),
    ("Investment Income", TransactionType::Income),
    ("Stock Purchase", TransactionType::Expense),
    ("Bond Purchase", TransactionType::Expense),
    ("ETF Purchase", TransactionType::Expense),
    ("Mutual Fund Purchase", TransactionType::Expense),
    ("Trading Fees", TransactionType::Expense),
];

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default and extended categories if the category table is empty.
///
/// Names that appear in both lists are only inserted once.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;

    if count > 0 {
        return Ok(());
    }

    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2)")?;

    for (name, kind) in DEFAULT_CATEGORIES.iter().chain(EXTENDED_CATEGORIES.iter()) {
        statement.execute((name, kind))?;
    }

    tracing::debug!("Seeded the category table");

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

/// Get every category, ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category ORDER BY name ASC")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Get the categories for either income or expenses, ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_categories_by_kind(
    kind: TransactionType,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE type = ?1 ORDER BY name ASC")?
        .query_map([kind], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Get a category by its name.
///
/// # Errors
/// Returns [Error::NotFound] if there is no category called `name`.
pub fn get_category_by_name(name: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE name = ?1")?
        .query_row([name], map_category_row)
        .map_err(Error::from)
}
