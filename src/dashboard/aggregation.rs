//! Transaction data aggregation for charts and summary cards.
//!
//! Provides functions to bucket transactions by day or month, calculate
//! running balances, and total income and expenses for a calendar month.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    Error,
    amount::{checked_add, checked_percent},
    transaction::{Transaction, TransactionType},
};

/// Number of daily buckets shown on the balance chart.
pub(crate) const DAILY_BUCKET_LIMIT: usize = 30;
/// Number of monthly buckets shown on the income and expenses chart.
pub(crate) const MONTHLY_BUCKET_LIMIT: usize = 6;

/// How transactions are grouped for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BucketSize {
    Day,
    Month,
}

impl BucketSize {
    /// The first day of the bucket containing `date`.
    fn bucket_start(&self, date: Date) -> Date {
        match self {
            BucketSize::Day => date,
            BucketSize::Month => date.replace_day(1).unwrap_or(date),
        }
    }
}

/// The totals for one day or month of transactions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartBucket {
    /// The first day of the bucket.
    pub date: Date,
    /// The sum of all transaction amounts up to and including this bucket.
    pub balance: Decimal,
    /// Income received in this bucket.
    pub income: Decimal,
    /// Money spent in this bucket, as a positive number.
    pub expenses: Decimal,
}

/// Groups transactions into chronologically sorted buckets.
///
/// `balance` is a running total across the buckets, so the last bucket's
/// balance is the sum of every transaction amount.
pub(crate) fn bucket_transactions(
    transactions: &[Transaction],
    bucket_size: BucketSize,
) -> Result<Vec<ChartBucket>, Error> {
    // (net amount, income, expenses) per bucket, kept sorted by date.
    let mut totals: BTreeMap<Date, (Decimal, Decimal, Decimal)> = BTreeMap::new();

    for transaction in transactions {
        let entry = totals
            .entry(bucket_size.bucket_start(transaction.date))
            .or_default();

        entry.0 = checked_add(entry.0, transaction.amount)?;
        match transaction.kind {
            TransactionType::Income => entry.1 = checked_add(entry.1, transaction.amount)?,
            TransactionType::Expense => entry.2 = checked_add(entry.2, transaction.amount.abs())?,
        }
    }

    let mut running_balance = Decimal::ZERO;

    totals
        .into_iter()
        .map(|(date, (net, income, expenses))| {
            running_balance = checked_add(running_balance, net)?;

            Ok(ChartBucket {
                date,
                balance: running_balance,
                income,
                expenses,
            })
        })
        .collect()
}

/// Keeps only the most recent `limit` buckets.
pub(crate) fn last_buckets(mut buckets: Vec<ChartBucket>, limit: usize) -> Vec<ChartBucket> {
    let excess = buckets.len().saturating_sub(limit);
    buckets.drain(..excess);
    buckets
}

/// Daily running balances for the last 30 days that have transactions.
pub(crate) fn daily_balances(transactions: &[Transaction]) -> Result<Vec<ChartBucket>, Error> {
    Ok(last_buckets(
        bucket_transactions(transactions, BucketSize::Day)?,
        DAILY_BUCKET_LIMIT,
    ))
}

/// Monthly income and expenses for the last six months that have transactions.
pub(crate) fn monthly_totals(transactions: &[Transaction]) -> Result<Vec<ChartBucket>, Error> {
    Ok(last_buckets(
        bucket_transactions(transactions, BucketSize::Month)?,
        MONTHLY_BUCKET_LIMIT,
    ))
}

/// Income and expenses for a single calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct MonthSummary {
    /// The sum of the income transactions.
    pub income: Decimal,
    /// The sum of the expense transactions, as a positive number.
    pub expenses: Decimal,
    /// The sum of every transaction amount.
    pub net: Decimal,
}

/// Totals the transactions dated in the same year and month as `month`.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if a total is too large to represent.
pub(crate) fn summarize_month(
    transactions: &[Transaction],
    month: Date,
) -> Result<MonthSummary, Error> {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.date.year() == month.year() && transaction.date.month() == month.month()
        })
        .try_fold(MonthSummary::default(), |mut summary, transaction| {
            summary.net = checked_add(summary.net, transaction.amount)?;
            match transaction.kind {
                TransactionType::Income => {
                    summary.income = checked_add(summary.income, transaction.amount)?
                }
                TransactionType::Expense => {
                    summary.expenses = checked_add(summary.expenses, transaction.amount.abs())?
                }
            }
            Ok(summary)
        })
}

/// A date in the month before the one containing `date`.
pub(crate) fn previous_month(date: Date) -> Date {
    // The first of the month is always valid, so this only fails at the start of the calendar.
    date.replace_day(1)
        .ok()
        .and_then(|first| first.previous_day())
        .unwrap_or(date)
}

/// Percentage change of `total_balance` relative to last month's net amount.
///
/// Returns zero when last month's net amount is zero or the change is too
/// large to represent.
pub(crate) fn monthly_change_percent(total_balance: Decimal, last_month_net: Decimal) -> Decimal {
    if last_month_net.is_zero() {
        return Decimal::ZERO;
    }

    total_balance
        .checked_sub(last_month_net)
        .and_then(|change| checked_percent(change, last_month_net.abs()))
        .unwrap_or_default()
}

/// Formats a date as a short label for the daily chart, e.g. "Mar 4".
pub(crate) fn format_day_label(date: Date) -> String {
    format!("{} {}", month_abbreviation(date.month()), date.day())
}

/// Formats a date as a short label for the monthly chart, e.g. "Mar 2025".
pub(crate) fn format_month_label(date: Date) -> String {
    format!("{} {}", month_abbreviation(date.month()), date.year())
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod aggregation_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, Duration, OffsetDateTime, macros::date};

    use crate::{
        Error,
        auth::UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::{
        BucketSize, bucket_transactions, daily_balances, format_day_label, format_month_label,
        monthly_change_percent, monthly_totals, previous_month, summarize_month,
    };

    fn create_test_transaction(amount: Decimal, date: Date) -> Transaction {
        let kind = if amount.is_sign_negative() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        };

        Transaction {
            id: 0,
            user_id: UserID::new(1),
            account_id: None,
            amount,
            description: "test".to_owned(),
            category: "Food".to_owned(),
            kind,
            date,
            is_external: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn buckets_by_day_with_running_balance() {
        let transactions = vec![
            create_test_transaction(dec!(-20), date!(2025 - 01 - 02)),
            create_test_transaction(dec!(100), date!(2025 - 01 - 01)),
            create_test_transaction(dec!(-40), date!(2025 - 01 - 01)),
        ];

        let buckets = bucket_transactions(&transactions, BucketSize::Day).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, date!(2025 - 01 - 01));
        assert_eq!(buckets[0].income, dec!(100));
        assert_eq!(buckets[0].expenses, dec!(40));
        assert_eq!(buckets[0].balance, dec!(60));
        assert_eq!(buckets[1].date, date!(2025 - 01 - 02));
        assert_eq!(buckets[1].expenses, dec!(20));
        assert_eq!(buckets[1].balance, dec!(40));
    }

    #[test]
    fn buckets_by_month() {
        let transactions = vec![
            create_test_transaction(dec!(10), date!(2025 - 01 - 31)),
            create_test_transaction(dec!(5), date!(2025 - 01 - 01)),
            create_test_transaction(dec!(-3), date!(2025 - 02 - 14)),
        ];

        let buckets = bucket_transactions(&transactions, BucketSize::Month).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, date!(2025 - 01 - 01));
        assert_eq!(buckets[0].income, dec!(15));
        assert_eq!(buckets[1].date, date!(2025 - 02 - 01));
        assert_eq!(buckets[1].balance, dec!(12));
    }

    #[test]
    fn income_minus_expenses_equals_sum_of_amounts() {
        let start = date!(2024 - 11 - 20);
        let transactions: Vec<_> = (0..75)
            .map(|i| {
                let amount = Decimal::from(i * 7 % 23) - dec!(11.25);
                create_test_transaction(amount, start + Duration::days(i % 40))
            })
            .collect();
        let want: Decimal = transactions.iter().map(|t| t.amount).sum();

        for bucket_size in [BucketSize::Day, BucketSize::Month] {
            let buckets = bucket_transactions(&transactions, bucket_size).unwrap();
            let income: Decimal = buckets.iter().map(|b| b.income).sum();
            let expenses: Decimal = buckets.iter().map(|b| b.expenses).sum();

            assert_eq!(income - expenses, want);
            assert_eq!(buckets.last().unwrap().balance, want);
        }
    }

    #[test]
    fn daily_balances_keeps_last_thirty_days() {
        let start = date!(2025 - 01 - 01);
        let transactions: Vec<_> = (0..45)
            .map(|i| create_test_transaction(dec!(1), start + Duration::days(i)))
            .collect();

        let buckets = daily_balances(&transactions).unwrap();

        assert_eq!(buckets.len(), 30);
        assert_eq!(buckets[0].date, start + Duration::days(15));
        // The running balance still counts the days that were cut off.
        assert_eq!(buckets[0].balance, dec!(16));
        assert_eq!(buckets[29].balance, dec!(45));
    }

    #[test]
    fn monthly_totals_keeps_last_six_months() {
        let transactions: Vec<_> = (1u8..=9)
            .map(|month| {
                create_test_transaction(
                    dec!(-10),
                    Date::from_calendar_date(2025, month.try_into().unwrap(), 15).unwrap(),
                )
            })
            .collect();

        let buckets = monthly_totals(&transactions).unwrap();

        assert_eq!(buckets.len(), 6);
        assert_eq!(buckets[0].date, date!(2025 - 04 - 01));
        assert_eq!(buckets[5].date, date!(2025 - 09 - 01));
    }

    #[test]
    fn summarize_month_matches_year_and_month() {
        let transactions = vec![
            create_test_transaction(dec!(100), date!(2025 - 03 - 01)),
            create_test_transaction(dec!(-40), date!(2025 - 03 - 31)),
            create_test_transaction(dec!(-999), date!(2024 - 03 - 15)),
            create_test_transaction(dec!(50), date!(2025 - 04 - 01)),
        ];

        let summary = summarize_month(&transactions, date!(2025 - 03 - 10)).unwrap();

        assert_eq!(summary.income, dec!(100));
        assert_eq!(summary.expenses, dec!(40));
        assert_eq!(summary.net, dec!(60));
    }

    #[test]
    fn totals_too_large_to_represent_are_an_error() {
        let transactions = vec![
            create_test_transaction(Decimal::MAX, date!(2025 - 03 - 01)),
            create_test_transaction(Decimal::MAX, date!(2025 - 03 - 02)),
        ];

        assert_eq!(daily_balances(&transactions), Err(Error::ArithmeticOverflow));
        assert_eq!(monthly_totals(&transactions), Err(Error::ArithmeticOverflow));
        assert_eq!(
            summarize_month(&transactions, date!(2025 - 03 - 10)),
            Err(Error::ArithmeticOverflow)
        );
    }

    #[test]
    fn monthly_change_too_large_to_represent_is_zero() {
        assert_eq!(monthly_change_percent(Decimal::MAX, dec!(-1)), Decimal::ZERO);
    }

    #[test]
    fn previous_month_crosses_year() {
        assert_eq!(previous_month(date!(2025 - 01 - 15)), date!(2024 - 12 - 31));
        assert_eq!(previous_month(date!(2025 - 03 - 31)), date!(2025 - 02 - 28));
    }

    #[test]
    fn monthly_change_is_zero_without_last_month() {
        assert_eq!(monthly_change_percent(dec!(500), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn monthly_change_is_relative_to_last_month() {
        assert_eq!(monthly_change_percent(dec!(150), dec!(100)), dec!(50));
        assert_eq!(monthly_change_percent(dec!(-50), dec!(-100)), dec!(50));
    }

    #[test]
    fn labels() {
        assert_eq!(format_day_label(date!(2025 - 03 - 04)), "Mar 4");
        assert_eq!(format_month_label(date!(2025 - 12 - 01)), "Dec 2025");
    }
}
