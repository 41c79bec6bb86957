//! Dashboard module
//!
//! Provides an overview page showing financial summaries and charts, plus the
//! card and chart building blocks shared with the transactions and
//! investments pages.

mod aggregation;
mod cards;
mod charts;
mod handlers;

pub(crate) use aggregation::{
    daily_balances, monthly_change_percent, monthly_totals, previous_month, summarize_month,
};
pub(crate) use cards::{CardTone, cards_grid, summary_card};
pub(crate) use charts::{
    DashboardChart, allocation_chart, balance_chart, chart_head_elements, charts_view,
    income_expenses_chart,
};
pub use handlers::{DashboardState, get_dashboard_page};
