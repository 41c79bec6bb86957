//! Dashboard HTTP handler and view rendering.
//!
//! The dashboard pulls together every part of the app: headline cards for net
//! worth, this month's cash flow and the investment portfolio, charts of the
//! running balance and monthly totals, the latest transactions and how the
//! budgets are tracking.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    AppState, Error,
    account::get_total_external_balance,
    amount::checked_sum,
    auth::UserID,
    budget::{BudgetSpending, get_user_budget_spending},
    dashboard::{
        CardTone, DashboardChart, balance_chart, cards_grid, chart_head_elements, charts_view,
        daily_balances, income_expenses_chart, monthly_change_percent, monthly_totals,
        previous_month, summarize_month, summary_card,
    },
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, format_percent, link},
    investment::{InvestmentStats, get_investment_stats},
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, get_user_transactions, transactions_table},
};

/// How many transactions the recent transactions list shows.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the user's data.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DashboardSummary {
    /// The sum of every transaction amount.
    pub total_balance: Decimal,
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    /// The net amount of last month's transactions.
    pub last_month_net: Decimal,
    /// Percentage change of `total_balance` relative to `last_month_net`.
    pub monthly_change: Decimal,
    /// The sum of the connected account balances.
    pub net_worth: Decimal,
    pub over_budget_count: usize,
    pub budget_count: usize,
}

/// Work out the dashboard figures from the user's data.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if a total is too large to represent.
pub(crate) fn summarize_dashboard(
    transactions: &[Transaction],
    net_worth: Decimal,
    budgets: &[BudgetSpending],
    today: Date,
) -> Result<DashboardSummary, Error> {
    let total_balance = checked_sum(transactions.iter().map(|transaction| transaction.amount))?;
    let this_month = summarize_month(transactions, today)?;
    let last_month = summarize_month(transactions, previous_month(today))?;

    Ok(DashboardSummary {
        total_balance,
        monthly_income: this_month.income,
        monthly_expenses: this_month.expenses,
        last_month_net: last_month.net,
        monthly_change: monthly_change_percent(total_balance, last_month.net),
        net_worth,
        over_budget_count: budgets.iter().filter(|budget| budget.is_over_budget()).count(),
        budget_count: budgets.len(),
    })
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let (transactions, net_worth, investments, budgets) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions = get_user_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
        let net_worth = get_total_external_balance(user_id, &connection).inspect_err(|error| {
            tracing::error!("could not calculate total account balance: {error}")
        })?;
        let investments = get_investment_stats(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get investment stats: {error}"))?;
        let budgets = get_user_budget_spending(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get budget spending: {error}"))?;

        (transactions, net_worth, investments, budgets)
    };

    let summary = summarize_dashboard(&transactions, net_worth, &budgets, today)
        .inspect_err(|error| tracing::error!("could not summarize dashboard: {error}"))?;

    let charts = if transactions.is_empty() {
        vec![]
    } else {
        vec![
            DashboardChart {
                id: "balance-chart",
                options: balance_chart(&daily_balances(&transactions)?).to_string(),
            },
            DashboardChart {
                id: "monthly-overview-chart",
                options: income_expenses_chart(&monthly_totals(&transactions)?).to_string(),
            },
        ]
    };

    let recent = &transactions[..transactions.len().min(RECENT_TRANSACTION_COUNT)];

    Ok(dashboard_view(&summary, &investments, &charts, recent, &budgets).into_response())
}

fn summary_cards(summary: &DashboardSummary, investments: &InvestmentStats) -> Markup {
    let change_sign = if summary.monthly_change.is_sign_negative() {
        ""
    } else {
        "+"
    };

    cards_grid(&[
        summary_card(
            "Net Worth",
            &format_currency(summary.net_worth),
            &format!(
                "{change_sign}{} from last month",
                format_percent(Some(summary.monthly_change))
            ),
            CardTone::from_sign(summary.monthly_change.is_sign_negative()),
        ),
        summary_card(
            "Monthly Income",
            &format_currency(summary.monthly_income),
            "This month",
            CardTone::Positive,
        ),
        summary_card(
            "Monthly Expenses",
            &format_currency(summary.monthly_expenses),
            "This month",
            CardTone::Negative,
        ),
        summary_card(
            "Investment Value",
            &format_currency(investments.total_value),
            &format!(
                "{} total return",
                format_percent(investments.total_gain_loss_percent)
            ),
            CardTone::from_sign(investments.total_gain_loss.is_sign_negative()),
        ),
    ])
}

fn budget_status(summary: &DashboardSummary, budgets: &[BudgetSpending]) -> Markup {
    html!(
        section class=(CARD_STYLE) id="budget-status"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-lg font-semibold" { "Budget Status" }
                span class="text-sm"
                {
                    (summary.over_budget_count) "/" (summary.budget_count) " over budget"
                }
            }

            @if budgets.is_empty() {
                p class="text-sm"
                {
                    "No budgets yet. Set one up on the "
                    (link(endpoints::BUDGETS_VIEW, "budgets page"))
                    "."
                }
            } @else {
                ul class="space-y-2"
                {
                    @for budget in budgets {
                        li class="flex justify-between text-sm"
                        {
                            span { (budget.budget.category_name) }
                            span class=(if budget.is_over_budget() {
                                "text-red-600 dark:text-red-400"
                            } else {
                                "text-gray-700 dark:text-gray-300"
                            })
                            {
                                (format_currency(budget.total_spent))
                                " of "
                                (format_currency(budget.budget.amount))
                            }
                        }
                    }
                }
            }
        }
    )
}

fn dashboard_view(
    summary: &DashboardSummary,
    investments: &InvestmentStats,
    charts: &[DashboardChart],
    recent: &[Transaction],
    budgets: &[BudgetSpending],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                h1 class="text-2xl font-bold" { "Dashboard" }

                (summary_cards(summary, investments))

                @if charts.is_empty() {
                    div class="text-center"
                    {
                        h2 class="text-xl font-bold" { "Nothing here yet..." }
                        p
                        {
                            "Charts will show up here once you have some transactions. You can add transactions "
                            (link(endpoints::NEW_TRANSACTION_VIEW, "manually"))
                            " or by connecting an account on the "
                            (link(endpoints::ACCOUNTS_VIEW, "accounts page"))
                            "."
                        }
                    }
                } @else {
                    (charts_view(charts))
                }

                div class="grid gap-4 lg:grid-cols-3"
                {
                    section class="lg:col-span-2" id="recent-transactions"
                    {
                        div class="flex justify-between items-baseline mb-2"
                        {
                            h2 class="text-lg font-semibold" { "Recent Transactions" }
                            (link(endpoints::TRANSACTIONS_VIEW, "View all"))
                        }

                        @if recent.is_empty() {
                            p class="text-sm" { "No transactions yet." }
                        } @else {
                            (transactions_table(recent, false))
                        }
                    }

                    (budget_status(summary, budgets))
                }
            }
        }
    );

    base("Dashboard", &chart_head_elements(charts), &content)
}
