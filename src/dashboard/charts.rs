//! Chart generation and rendering.
//!
//! This module creates interactive ECharts visualizations for financial data:
//! - **Balance Chart**: Running balance for the last thirty days with transactions
//! - **Income vs Expenses Chart**: Monthly totals for the last six months
//! - **Asset Allocation Chart**: Value of investments grouped by type
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Bar, Line, Pie},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    dashboard::aggregation::{ChartBucket, format_day_label, format_month_label},
    html::HeadElement,
};

/// A chart with its HTML container ID and ECharts configuration.
pub(crate) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for charts.
pub(crate) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// The script elements needed to draw `charts`: the ECharts library and the
/// initialization code.
pub(crate) fn chart_head_elements(charts: &[DashboardChart]) -> [HeadElement; 2] {
    [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ]
}

/// Generates JavaScript initialization code for charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// A line chart of the running balance at the end of each day.
pub(crate) fn balance_chart(daily_buckets: &[ChartBucket]) -> Chart {
    let labels: Vec<String> = daily_buckets
        .iter()
        .map(|bucket| format_day_label(bucket.date))
        .collect();
    let values: Vec<f64> = daily_buckets
        .iter()
        .map(|bucket| to_f64(bucket.balance))
        .collect();

    Chart::new()
        .title(Title::new().text("Balance").subtext("Last 30 days"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Balance").data(values))
}

/// A bar chart comparing income and expenses per month.
pub(crate) fn income_expenses_chart(monthly_buckets: &[ChartBucket]) -> Chart {
    let labels: Vec<String> = monthly_buckets
        .iter()
        .map(|bucket| format_month_label(bucket.date))
        .collect();
    let income: Vec<f64> = monthly_buckets
        .iter()
        .map(|bucket| to_f64(bucket.income))
        .collect();
    let expenses: Vec<f64> = monthly_buckets
        .iter()
        .map(|bucket| to_f64(bucket.expenses))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expenses")
                .subtext("Last six months"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().right("4%"))
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Income").data(income))
        .series(Bar::new().name("Expenses").data(expenses))
}

/// A donut chart of the total value held in each investment type.
pub(crate) fn allocation_chart(allocation: &[(&str, Decimal)]) -> Chart {
    let data: Vec<(f64, &str)> = allocation
        .iter()
        .map(|(label, value)| (to_f64(*value), *label))
        .collect();

    Chart::new()
        .title(Title::new().text("Asset Allocation"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Value")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
