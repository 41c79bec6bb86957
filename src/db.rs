//! Creates the application's tables and provides helpers for column types
//! that SQLite does not support natively.

use std::str::FromStr;

use rusqlite::{Connection, Row, TransactionBehavior, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error,
    account::create_external_account_table,
    auth::create_user_table,
    budget::create_budget_table,
    category::{create_category_table, seed_default_categories},
    investment::{create_dividend_table, create_investment_table},
    transaction::create_transaction_table,
};

/// Create all the tables for the application and seed the default categories.
///
/// Safe to call on an existing database, tables are only created if they
/// do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_external_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_investment_table(&transaction)?;
    create_dividend_table(&transaction)?;

    seed_default_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a [Decimal] stored as TEXT from column `index` of `row`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}


#[cfg(test)]
mod get_decimal_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use super::get_decimal;

    #[test]
    fn reads_decimal_text() {
        let connection = Connection::open_in_memory().unwrap();

        let value = connection
            .query_row("SELECT '-12.30'", [], |row| get_decimal(row, 0))
            .unwrap();

        assert_eq!(value, dec!(-12.30));
    }

    #[test]
    fn rejects_text_that_is_not_a_number() {
        let connection = Connection::open_in_memory().unwrap();

        let result = connection.query_row("SELECT 'twelve'", [], |row| get_decimal(row, 0));

        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(0, _, _))
        ));
    }
}
