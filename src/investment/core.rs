//! Defines the investment and dividend models and their database queries.

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
    database_id::{DividendId, InvestmentId},
    db::get_decimal,
};

// ============================================================================
// MODELS
// ============================================================================

/// The kind of asset an investment holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    Stock,
    Etf,
    Crypto,
    Bond,
    MutualFund,
}

impl InvestmentType {
    /// Every investment type, in display order.
    pub const ALL: [InvestmentType; 5] = [
        InvestmentType::Stock,
        InvestmentType::Etf,
        InvestmentType::Crypto,
        InvestmentType::Bond,
        InvestmentType::MutualFund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::Stock => "stock",
            InvestmentType::Etf => "etf",
            InvestmentType::Crypto => "crypto",
            InvestmentType::Bond => "bond",
            InvestmentType::MutualFund => "mutual_fund",
        }
    }

    /// The human readable name, e.g. "Mutual Fund".
    pub fn label(&self) -> &'static str {
        match self {
            InvestmentType::Stock => "Stock",
            InvestmentType::Etf => "ETF",
            InvestmentType::Crypto => "Crypto",
            InvestmentType::Bond => "Bond",
            InvestmentType::MutualFund => "Mutual Fund",
        }
    }
}

impl Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvestmentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown investment type \"{s}\""))
    }
}

impl ToSql for InvestmentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvestmentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A holding of a stock, fund or coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub user_id: UserID,
    /// The ticker symbol, e.g. "VTI".
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentType,
    /// The number of units held, may be fractional.
    pub shares: Decimal,
    /// The average price paid per unit.
    pub average_cost: Decimal,
    /// The latest known price per unit.
    pub current_price: Decimal,
    /// When `current_price` was last set.
    pub last_updated: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// The data needed to create an investment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentType,
    pub shares: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
}

/// A dividend paid out by an investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub id: DividendId,
    pub investment_id: InvestmentId,
    pub amount: Decimal,
    pub payment_date: Date,
    /// Whether the payout was used to buy more of the investment.
    pub reinvested: bool,
    pub created_at: OffsetDateTime,
}

/// The data needed to record a dividend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDividend {
    pub investment_id: InvestmentId,
    pub amount: Decimal,
    pub payment_date: Date,
    pub reinvested: bool,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the investment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_investment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS investment (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                shares TEXT NOT NULL,
                average_cost TEXT NOT NULL,
                current_price TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_investment_user ON investment(user_id);",
        (),
    )?;

    Ok(())
}

/// Create the dividend table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_dividend_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS dividend (
                id INTEGER PRIMARY KEY,
                investment_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                payment_date TEXT NOT NULL,
                reinvested INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(investment_id) REFERENCES investment(id) ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_dividend_investment ON dividend(investment_id, payment_date);",
        (),
    )?;

    Ok(())
}

const SELECT_INVESTMENT: &str = "SELECT id, user_id, symbol, name, type, shares, average_cost, \
    current_price, last_updated, created_at FROM investment";

const SELECT_DIVIDEND: &str = "SELECT dividend.id, dividend.investment_id, dividend.amount, \
    dividend.payment_date, dividend.reinvested, dividend.created_at \
    FROM dividend INNER JOIN investment ON investment.id = dividend.investment_id";

fn map_investment_row(row: &Row) -> Result<Investment, rusqlite::Error> {
    Ok(Investment {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        symbol: row.get(2)?,
        name: row.get(3)?,
        kind: row.get(4)?,
        shares: get_decimal(row, 5)?,
        average_cost: get_decimal(row, 6)?,
        current_price: get_decimal(row, 7)?,
        last_updated: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_dividend_row(row: &Row) -> Result<Dividend, rusqlite::Error> {
    Ok(Dividend {
        id: row.get(0)?,
        investment_id: row.get(1)?,
        amount: get_decimal(row, 2)?,
        payment_date: row.get(3)?,
        reinvested: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Add an investment to the user's portfolio.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn add_investment(
    user_id: UserID,
    new_investment: NewInvestment,
    connection: &Connection,
) -> Result<Investment, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO investment (user_id, symbol, name, type, shares, average_cost, current_price, last_updated, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id, user_id, symbol, name, type, shares, average_cost, current_price, last_updated, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_investment.symbol,
                new_investment.name,
                new_investment.kind,
                new_investment.shares.to_string(),
                new_investment.average_cost.to_string(),
                new_investment.current_price.to_string(),
                now,
                now,
            ),
            map_investment_row,
        )
        .map_err(Error::from)
}

/// Get one of the user's investments.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an investment owned by `user_id`.
pub fn get_investment(
    user_id: UserID,
    id: InvestmentId,
    connection: &Connection,
) -> Result<Investment, Error> {
    connection
        .prepare(&format!("{SELECT_INVESTMENT} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((id, user_id.as_i64()), map_investment_row)
        .map_err(Error::from)
}

/// Get all of the user's investments ordered by symbol.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_investments(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_INVESTMENT} WHERE user_id = ?1 ORDER BY symbol ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_investment_row)?
        .map(|maybe_investment| maybe_investment.map_err(Error::from))
        .collect()
}

/// Set the current price of one of the user's investments and stamp `last_updated`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingInvestment] if `id` does not refer to an investment owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_investment_price(
    user_id: UserID,
    id: InvestmentId,
    current_price: Decimal,
    connection: &Connection,
) -> Result<Investment, Error> {
    let rows_affected = connection.execute(
        "UPDATE investment SET current_price = ?1, last_updated = ?2 WHERE id = ?3 AND user_id = ?4",
        (
            current_price.to_string(),
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingInvestment);
    }

    get_investment(user_id, id, connection)
}

/// Record a dividend for one of the user's investments.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInvestment] if the investment does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_dividend(
    user_id: UserID,
    new_dividend: NewDividend,
    connection: &Connection,
) -> Result<Dividend, Error> {
    get_investment(user_id, new_dividend.investment_id, connection).map_err(
        |error| match error {
            Error::NotFound => Error::InvalidInvestment(new_dividend.investment_id),
            error => error,
        },
    )?;

    connection
        .prepare(
            "INSERT INTO dividend (investment_id, amount, payment_date, reinvested, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, investment_id, amount, payment_date, reinvested, created_at",
        )?
        .query_row(
            (
                new_dividend.investment_id,
                new_dividend.amount.to_string(),
                new_dividend.payment_date,
                new_dividend.reinvested,
                OffsetDateTime::now_utc(),
            ),
            map_dividend_row,
        )
        .map_err(Error::from)
}

/// Get the dividends paid by one of the user's investments, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_investment_dividends(
    user_id: UserID,
    investment_id: InvestmentId,
    connection: &Connection,
) -> Result<Vec<Dividend>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_DIVIDEND} WHERE dividend.investment_id = ?1 AND investment.user_id = ?2 \
            ORDER BY dividend.payment_date DESC, dividend.id DESC"
        ))?
        .query_map((investment_id, user_id.as_i64()), map_dividend_row)?
        .map(|maybe_dividend| maybe_dividend.map_err(Error::from))
        .collect()
}

/// Get the dividends paid by all of the user's investments, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_dividends(user_id: UserID, connection: &Connection) -> Result<Vec<Dividend>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_DIVIDEND} WHERE investment.user_id = ?1 \
            ORDER BY dividend.payment_date DESC, dividend.id DESC"
        ))?
        .query_map([user_id.as_i64()], map_dividend_row)?
        .map(|maybe_dividend| maybe_dividend.map_err(Error::from))
        .collect()
}
