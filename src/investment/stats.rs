//! Portfolio totals and the value of each holding.

use std::collections::BTreeMap;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error,
    amount::{checked_add, checked_mul, checked_percent, checked_sub, checked_sum},
    auth::UserID,
    investment::{Investment, InvestmentType, get_user_investments},
};

/// An investment with its market value and gain or loss.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub investment: Investment,
    /// `shares * current_price`
    pub value: Decimal,
    /// `shares * average_cost`
    pub cost: Decimal,
    pub gain_loss: Decimal,
    /// `None` when the cost is zero.
    pub gain_loss_percent: Option<Decimal>,
}

impl Holding {
    /// Value `investment` at its current price.
    ///
    /// # Errors
    /// Returns [Error::ArithmeticOverflow] if the value or cost is too large to represent.
    pub fn new(investment: Investment) -> Result<Self, Error> {
        let value = checked_mul(investment.shares, investment.current_price)?;
        let cost = checked_mul(investment.shares, investment.average_cost)?;
        let gain_loss = checked_sub(value, cost)?;

        Ok(Self {
            investment,
            value,
            cost,
            gain_loss,
            gain_loss_percent: checked_percent(gain_loss, cost),
        })
    }
}

/// Totals across every holding in a portfolio.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvestmentStats {
    pub holdings: Vec<Holding>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain_loss: Decimal,
    /// `None` when the total cost is zero.
    pub total_gain_loss_percent: Option<Decimal>,
    /// The summed value of the holdings of each type.
    pub asset_allocation: BTreeMap<InvestmentType, Decimal>,
}

/// Value each investment and total up the portfolio.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if a value or total is too large to represent.
pub fn calculate_investment_stats(investments: Vec<Investment>) -> Result<InvestmentStats, Error> {
    let holdings = investments
        .into_iter()
        .map(Holding::new)
        .collect::<Result<Vec<_>, _>>()?;

    let total_value = checked_sum(holdings.iter().map(|holding| holding.value))?;
    let total_cost = checked_sum(holdings.iter().map(|holding| holding.cost))?;
    let total_gain_loss = checked_sub(total_value, total_cost)?;

    let mut asset_allocation = BTreeMap::new();
    for holding in &holdings {
        let total = asset_allocation
            .entry(holding.investment.kind)
            .or_insert(Decimal::ZERO);
        *total = checked_add(*total, holding.value)?;
    }

    Ok(InvestmentStats {
        holdings,
        total_value,
        total_cost,
        total_gain_loss,
        total_gain_loss_percent: checked_percent(total_gain_loss, total_cost),
        asset_allocation,
    })
}

/// Load the user's investments and total up their portfolio.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or
/// [Error::ArithmeticOverflow] if the portfolio is too large to total.
pub fn get_investment_stats(
    user_id: UserID,
    connection: &Connection,
) -> Result<InvestmentStats, Error> {
    let investments = get_user_investments(user_id, connection)?;

    calculate_investment_stats(investments)
}

#[cfg(test)]
mod stats_tests {
    use std::sync::{Arc, Mutex};

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::OffsetDateTime;

    use crate::{
        Error,
        auth::UserID,
        investment::{Investment, InvestmentType, NewInvestment, add_investment},
        test_utils::get_test_connection,
    };

    use super::{Holding, calculate_investment_stats, get_investment_stats};

    fn investment(
        kind: InvestmentType,
        shares: Decimal,
        average_cost: Decimal,
        current_price: Decimal,
    ) -> Investment {
        Investment {
            id: 1,
            user_id: UserID::new(1),
            symbol: "TEST".to_owned(),
            name: "Test".to_owned(),
            kind,
            shares,
            average_cost,
            current_price,
            last_updated: OffsetDateTime::UNIX_EPOCH,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn holding_value_cost_and_gain() {
        let holding = Holding::new(investment(
            InvestmentType::Stock,
            dec!(10),
            dec!(100),
            dec!(120),
        ))
        .unwrap();

        assert_eq!(holding.value, dec!(1200));
        assert_eq!(holding.cost, dec!(1000));
        assert_eq!(holding.gain_loss, dec!(200));
        assert_eq!(holding.gain_loss_percent, Some(dec!(20)));
    }

    #[test]
    fn totals_and_allocation() {
        let stats = calculate_investment_stats(vec![
            investment(InvestmentType::Stock, dec!(10), dec!(100), dec!(120)),
            investment(InvestmentType::Etf, dec!(5), dec!(200), dec!(180)),
            investment(InvestmentType::Stock, dec!(1), dec!(50), dec!(50)),
        ])
        .unwrap();

        assert_eq!(stats.total_value, dec!(2150));
        assert_eq!(stats.total_cost, dec!(2050));
        assert_eq!(stats.total_gain_loss, stats.total_value - stats.total_cost);
        assert_eq!(stats.asset_allocation[&InvestmentType::Stock], dec!(1250));
        assert_eq!(stats.asset_allocation[&InvestmentType::Etf], dec!(900));
        assert!(!stats.asset_allocation.contains_key(&InvestmentType::Crypto));
    }

    #[test]
    fn empty_portfolio_has_no_return_percent() {
        let stats = calculate_investment_stats(vec![]).unwrap();

        assert_eq!(stats.total_value, Decimal::ZERO);
        assert_eq!(stats.total_gain_loss_percent, None);
        assert!(stats.asset_allocation.is_empty());
    }

    #[test]
    fn value_too_large_to_represent_is_an_error() {
        let shares = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let huge = investment(InvestmentType::Stock, shares, dec!(1), shares);

        assert_eq!(Holding::new(huge.clone()), Err(Error::ArithmeticOverflow));
        assert_eq!(
            calculate_investment_stats(vec![huge]),
            Err(Error::ArithmeticOverflow)
        );
    }

    #[test]
    fn oversized_portfolio_leaves_connection_usable() {
        let (conn, user_id) = get_test_connection();
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        add_investment(
            user_id,
            NewInvestment {
                symbol: "BIG".to_owned(),
                name: "Big Holdings".to_owned(),
                kind: InvestmentType::Stock,
                shares: huge,
                average_cost: dec!(1),
                current_price: huge,
            },
            &conn,
        )
        .unwrap();
        let db_connection = Arc::new(Mutex::new(conn));

        let result = {
            let connection = db_connection.lock().unwrap();
            get_investment_stats(user_id, &connection)
        };

        assert_eq!(result, Err(Error::ArithmeticOverflow));
        assert!(!db_connection.is_poisoned());
    }
}
