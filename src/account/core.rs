//! Defines the external account model and its database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, amount::checked_sum, auth::UserID, database_id::AccountId, db::get_decimal};

/// The kind of financial institution account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Credit,
    Bank,
    Investment,
}

impl AccountType {
    /// Every account type, in display order.
    pub const ALL: [AccountType; 3] = [
        AccountType::Credit,
        AccountType::Bank,
        AccountType::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Credit => "credit",
            AccountType::Bank => "bank",
            AccountType::Investment => "investment",
        }
    }

    /// The heading used when listing accounts of this type.
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Credit => "Credit Cards",
            AccountType::Bank => "Bank Accounts",
            AccountType::Investment => "Investment Accounts",
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(AccountType::Credit),
            "bank" => Ok(AccountType::Bank),
            "investment" => Ok(AccountType::Investment),
            other => Err(format!("unknown account type \"{other}\"")),
        }
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An account at a bank, card issuer or broker that has been linked to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: AccountId,
    pub user_id: UserID,
    /// The provider's identifier, e.g. "chase".
    pub provider: String,
    pub kind: AccountType,
    /// The product name, e.g. "Sapphire Reserve".
    pub name: String,
    /// The last four digits of the account number.
    pub last_four: String,
    pub balance: Decimal,
    pub created_at: OffsetDateTime,
}

/// The data needed to store a linked account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExternalAccount {
    pub provider: String,
    pub kind: AccountType,
    pub name: String,
    pub last_four: String,
    pub balance: Decimal,
}

/// Create the external account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_external_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS external_account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            provider TEXT NOT NULL,
            type TEXT NOT NULL,
            name TEXT NOT NULL,
            last_four TEXT NOT NULL,
            balance TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_external_account_user ON external_account(user_id);",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str = "SELECT id, user_id, provider, type, name, last_four, balance, \
    created_at FROM external_account";

fn map_account_row(row: &Row) -> Result<ExternalAccount, rusqlite::Error> {
    Ok(ExternalAccount {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        provider: row.get(2)?,
        kind: row.get(3)?,
        name: row.get(4)?,
        last_four: row.get(5)?,
        balance: get_decimal(row, 6)?,
        created_at: row.get(7)?,
    })
}

/// Store a linked account for the user.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn add_external_account(
    user_id: UserID,
    new_account: NewExternalAccount,
    connection: &Connection,
) -> Result<ExternalAccount, Error> {
    connection
        .prepare(
            "INSERT INTO external_account (user_id, provider, type, name, last_four, balance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, user_id, provider, type, name, last_four, balance, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_account.provider,
                new_account.kind,
                new_account.name,
                new_account.last_four,
                new_account.balance.to_string(),
                OffsetDateTime::now_utc(),
            ),
            map_account_row,
        )
        .map_err(Error::from)
}

/// Get one of the user's linked accounts.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an account owned by `user_id`.
pub fn get_external_account(
    user_id: UserID,
    id: AccountId,
    connection: &Connection,
) -> Result<ExternalAccount, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((id, user_id.as_i64()), map_account_row)
        .map_err(Error::from)
}

/// Get the user's linked accounts, most recently connected first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_external_accounts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<ExternalAccount>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the sum of the balances of the user's linked accounts.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or
/// [Error::ArithmeticOverflow] if the total is too large to represent.
pub fn get_total_external_balance(
    user_id: UserID,
    connection: &Connection,
) -> Result<Decimal, Error> {
    // Balances are stored as text, so sum them here to keep full precision.
    checked_sum(
        get_user_external_accounts(user_id, connection)?
            .iter()
            .map(|account| account.balance),
    )
}

/// Remove one of the user's linked accounts and every transaction imported from it.
///
/// Both deletes happen in one SQL transaction, so a failure leaves the data untouched.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountNotFound] if `id` does not refer to an account owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn disconnect_external_account(
    user_id: UserID,
    id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1 AND account_id = ?2",
        (user_id.as_i64(), id),
    )?;

    let rows_affected = sql_transaction.execute(
        "DELETE FROM external_account WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        // Dropping the transaction rolls it back.
        return Err(Error::AccountNotFound);
    }

    sql_transaction.commit()?;

    Ok(())
}
