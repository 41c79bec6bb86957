//! Investment holdings, their dividends and portfolio statistics.

mod core;
mod create_endpoint;
mod dividend_endpoint;
mod investments_page;
mod price_endpoint;
mod stats;

pub use core::{
    Dividend, Investment, InvestmentType, NewDividend, NewInvestment, add_dividend,
    add_investment, create_dividend_table, create_investment_table, get_investment,
    get_investment_dividends, get_user_dividends, get_user_investments, update_investment_price,
};
pub use create_endpoint::create_investment_endpoint;
pub use dividend_endpoint::add_dividend_endpoint;
pub use investments_page::get_investments_page;
pub use price_endpoint::update_price_endpoint;
pub use stats::{Holding, InvestmentStats, calculate_investment_stats, get_investment_stats};
