//! Synthetic data for connected accounts.
//!
//! There is no real bank feed. Connecting an account fills it with plausible
//! transactions, and investment accounts also get a handful of holdings.
//! Every generator takes the random number generator as an argument so tests
//! can use a seeded one.

use rand::{Rng, seq::SliceRandom};
use rust_decimal::Decimal;
use time::{Date, Duration};

use crate::{
    account::AccountType,
    investment::{InvestmentType, NewInvestment},
    transaction::{NewTransaction, TransactionType},
};

/// How many days back generated transactions may be dated.
const HISTORY_DAYS: i64 = 90;

const CREDIT_CATEGORIES: &[(&str, TransactionType)] = &[
    ("Dining & Restaurants", TransactionType::Expense),
    ("Travel & Transportation", TransactionType::Expense),
    ("Shopping & Retail", TransactionType::Expense),
    ("Entertainment", TransactionType::Expense),
];

const BANK_CATEGORIES: &[(&str, TransactionType)] = &[
    ("Direct Deposit", TransactionType::Income),
    ("ATM Withdrawal", TransactionType::Expense),
    ("Mortgage/Rent", TransactionType::Expense),
    ("Insurance", TransactionType::Expense),
];

const INVESTMENT_CATEGORIES: &[(&str, TransactionType)] = &[
    ("Dividend Income", TransactionType::Income),
    ("Stock Purchase", TransactionType::Expense),
    ("ETF Purchase", TransactionType::Expense),
    ("Trading Fees", TransactionType::Expense),
];

fn category_pool(kind: AccountType) -> &'static [(&'static str, TransactionType)] {
    match kind {
        AccountType::Credit => CREDIT_CATEGORIES,
        AccountType::Bank => BANK_CATEGORIES,
        AccountType::Investment => INVESTMENT_CATEGORIES,
    }
}

fn descriptions(category: &str) -> &'static [&'static str] {
    match category {
        "Dining & Restaurants" => &[
            "Starbucks",
            "Chipotle",
            "Local Restaurant",
            "Pizza Delivery",
            "Sushi Bar",
        ],
        "Travel & Transportation" => &["Uber", "Lyft", "Airlines Ticket", "Hotel Stay", "Car Rental"],
        "Shopping & Retail" => &["Amazon", "Target", "Walmart", "Best Buy", "Apple Store"],
        "Entertainment" => &["Netflix", "Movie Theater", "Concert Tickets", "Spotify", "Gaming"],
        "Direct Deposit" => &["Salary", "Payroll", "Company Name Deposit"],
        "ATM Withdrawal" => &["ATM Withdrawal", "Cash Withdrawal"],
        "Mortgage/Rent" => &["Monthly Rent", "Mortgage Payment"],
        "Insurance" => &["Car Insurance", "Home Insurance", "Health Insurance"],
        "Dividend Income" => &["Stock Dividend", "ETF Distribution", "Fund Distribution"],
        "Stock Purchase" => &["AAPL Share", "GOOGL Share", "MSFT Share", "AMZN Share"],
        "ETF Purchase" => &["VOO Share", "VTI Share", "QQQ Share", "SPY Share"],
        "Trading Fees" => &["Commission", "Exchange Fee", "Trading Fee"],
        _ => &["Transaction"],
    }
}

/// A random amount in `[low, high)` dollars, in whole cents.
fn random_dollars<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Decimal {
    Decimal::new(rng.gen_range(low * 100..high * 100), 2)
}

/// A random starting balance for a new account of `kind`.
pub fn generate_balance<R: Rng + ?Sized>(kind: AccountType, rng: &mut R) -> Decimal {
    match kind {
        AccountType::Credit => random_dollars(rng, 1_000, 6_000),
        AccountType::Bank => random_dollars(rng, 5_000, 25_000),
        AccountType::Investment => random_dollars(rng, 50_000, 150_000),
    }
}

/// Four random digits, never starting with zero.
pub fn generate_last_four<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(1000..=9999).to_string()
}

fn transaction_amount<R: Rng + ?Sized>(
    account_kind: AccountType,
    transaction_kind: TransactionType,
    rng: &mut R,
) -> Decimal {
    match (account_kind, transaction_kind) {
        (AccountType::Credit, _) => random_dollars(rng, 10, 210),
        (AccountType::Bank, TransactionType::Expense) => random_dollars(rng, 100, 1_100),
        (AccountType::Bank, TransactionType::Income) => random_dollars(rng, 2_000, 5_000),
        (AccountType::Investment, TransactionType::Expense) => random_dollars(rng, 1_000, 6_000),
        (AccountType::Investment, TransactionType::Income) => random_dollars(rng, 100, 1_100),
    }
}

/// Between 30 and 49 transactions for an account of `kind`, dated within the
/// 90 days up to and including `today`, newest first.
pub fn generate_mock_transactions<R: Rng + ?Sized>(
    kind: AccountType,
    today: Date,
    rng: &mut R,
) -> Vec<NewTransaction> {
    let count = rng.gen_range(30..50);
    let pool = category_pool(kind);

    let mut transactions: Vec<NewTransaction> = (0..count)
        .filter_map(|_| {
            let &(category, transaction_kind) = pool.choose(rng)?;
            let description = descriptions(category).choose(rng)?;
            let amount = transaction_amount(kind, transaction_kind, rng);
            let date = today - Duration::days(rng.gen_range(0..HISTORY_DAYS));

            Some(NewTransaction::new(amount, description, category, transaction_kind).date(date))
        })
        .collect();

    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    transactions
}

/// (symbol, name, type) of the index funds each broker offers.
type Fund = (&'static str, &'static str, InvestmentType);

const VANGUARD_FUNDS: [Fund; 3] = [
    ("VTI", "Vanguard Total Stock Market ETF", InvestmentType::Etf),
    ("VFIAX", "Vanguard 500 Index Fund", InvestmentType::MutualFund),
    ("BND", "Vanguard Total Bond Market ETF", InvestmentType::Bond),
];

const FIDELITY_FUNDS: [Fund; 3] = [
    ("FXAIX", "Fidelity 500 Index Fund", InvestmentType::MutualFund),
    (
        "FTEC",
        "Fidelity MSCI Information Technology ETF",
        InvestmentType::Etf,
    ),
    ("FBND", "Fidelity Total Bond ETF", InvestmentType::Bond),
];

const SCHWAB_FUNDS: [Fund; 3] = [
    ("SWPPX", "Schwab S&P 500 Index Fund", InvestmentType::MutualFund),
    ("SCHD", "Schwab US Dividend Equity ETF", InvestmentType::Etf),
    ("SCHZ", "Schwab US Aggregate Bond ETF", InvestmentType::Bond),
];

const COMMON_STOCKS: [(&str, &str); 3] = [
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
];

/// Probability that each common stock is part of a generated portfolio.
const STOCK_PROBABILITY: f64 = 0.7;

fn provider_funds(provider: &str) -> &'static [Fund; 3] {
    match provider {
        "fidelity" => &FIDELITY_FUNDS,
        "schwab" => &SCHWAB_FUNDS,
        _ => &VANGUARD_FUNDS,
    }
}

/// An average cost up to 10% below `price`.
fn discounted_cost<R: Rng + ?Sized>(price: Decimal, rng: &mut R) -> Decimal {
    let discount = Decimal::new(rng.gen_range(0..1000), 4);

    (price * (Decimal::ONE - discount)).round_dp(4)
}

fn holding<R: Rng + ?Sized>(
    (symbol, name, kind): Fund,
    current_price: Decimal,
    shares: Decimal,
    rng: &mut R,
) -> NewInvestment {
    NewInvestment {
        symbol: symbol.to_owned(),
        name: name.to_owned(),
        kind,
        shares,
        average_cost: discounted_cost(current_price, rng),
        current_price,
    }
}

/// Holdings for a newly connected investment account at `provider`.
///
/// Always includes three of the provider's funds (Vanguard's for unknown
/// providers), some common stocks, and Bitcoin and Ether for crypto brokers.
pub fn generate_mock_investments<R: Rng + ?Sized>(provider: &str, rng: &mut R) -> Vec<NewInvestment> {
    let mut investments = Vec::new();

    for fund in provider_funds(provider) {
        let price = random_dollars(rng, 50, 250);
        let shares = Decimal::new(rng.gen_range(1_000..11_000), 2);
        investments.push(holding(*fund, price, shares, rng));
    }

    for (symbol, name) in COMMON_STOCKS {
        if rng.gen_bool(STOCK_PROBABILITY) {
            let price = random_dollars(rng, 100, 300);
            let shares = Decimal::new(rng.gen_range(500..5_500), 2);
            investments.push(holding((symbol, name, InvestmentType::Stock), price, shares, rng));
        }
    }

    if matches!(provider, "robinhood" | "coinbase") {
        let coins = [
            ("BTC", "Bitcoin", random_dollars(rng, 30_000, 35_000)),
            ("ETH", "Ethereum", random_dollars(rng, 1_800, 2_000)),
        ];

        for (symbol, name, price) in coins {
            let shares = Decimal::new(rng.gen_range(1_000..21_000), 4);
            investments.push(holding((symbol, name, InvestmentType::Crypto), price, shares, rng));
        }
    }

    investments
}
