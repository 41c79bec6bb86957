//! Defines the route handler for the investments page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        CardTone, DashboardChart, allocation_chart, cards_grid, chart_head_elements, charts_view,
        summary_card,
    },
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, format_percent,
    },
    investment::{
        Dividend, Holding, InvestmentStats, InvestmentType, get_investment_stats,
        get_user_dividends,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the investments page.
#[derive(Debug, Clone)]
pub struct InvestmentsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for InvestmentsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the user's portfolio, its allocation and the dividends it has paid.
pub async fn get_investments_page(
    State(state): State<InvestmentsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let (stats, dividends) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let stats = get_investment_stats(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get investments: {error}"))?;
        let dividends = get_user_dividends(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get dividends: {error}"))?;

        (stats, dividends)
    };

    Ok(investments_view(&stats, &dividends, today).into_response())
}

fn signed_currency(amount: rust_decimal::Decimal) -> String {
    if amount.is_sign_negative() {
        format_currency(amount)
    } else {
        format!("+{}", format_currency(amount))
    }
}

fn investments_view(stats: &InvestmentStats, dividends: &[Dividend], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVESTMENTS_VIEW).into_html();

    let gain_tone = CardTone::from_sign(stats.total_gain_loss.is_sign_negative());
    let cards = [
        summary_card(
            "Portfolio Value",
            &format_currency(stats.total_value),
            &format!("{} holdings", stats.holdings.len()),
            CardTone::Neutral,
        ),
        summary_card(
            "Total Gain/Loss",
            &signed_currency(stats.total_gain_loss),
            &format!("{} total return", format_percent(stats.total_gain_loss_percent)),
            gain_tone,
        ),
        summary_card(
            "Total Cost",
            &format_currency(stats.total_cost),
            "Amount invested",
            CardTone::Neutral,
        ),
    ];

    let allocation: Vec<(&str, rust_decimal::Decimal)> = stats
        .asset_allocation
        .iter()
        .map(|(kind, value)| (kind.label(), *value))
        .collect();
    let charts = if allocation.is_empty() {
        vec![]
    } else {
        vec![DashboardChart {
            id: "allocation-chart",
            options: allocation_chart(&allocation).to_string(),
        }]
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                h1 class="text-2xl font-bold" { "Investments" }

                (cards_grid(&cards))

                @if stats.holdings.is_empty() {
                    p { "No investments yet. Add one below or connect an investment account." }
                } @else {
                    (charts_view(&charts))
                    (holdings_table(&stats.holdings))
                }

                div class="grid gap-4 md:grid-cols-2"
                {
                    (new_investment_form())
                    (dividend_form(&stats.holdings, today))
                }

                (dividends_table(dividends, &stats.holdings))
            }
        }
    };

    base("Investments", &chart_head_elements(&charts), &content)
}

fn holdings_table(holdings: &[Holding]) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md sm:rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Symbol" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Shares" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Value" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Gain/Loss" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Price" }
                    }
                }

                tbody
                {
                    @for holding in holdings {
                        @let investment = &holding.investment;
                        @let gain_style = if holding.gain_loss.is_sign_negative() {
                            "text-red-600 dark:text-red-400"
                        } else {
                            "text-green-600 dark:text-green-400"
                        };

                        tr class=(TABLE_ROW_STYLE) data-investment-id=(investment.id)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class="font-medium text-gray-900 dark:text-white" { (investment.symbol) }
                                br;
                                span class="text-xs" { (investment.name) }
                            }
                            td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (investment.kind.label()) } }
                            td class=(TABLE_CELL_STYLE) { (investment.shares.normalize()) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(holding.value)) }
                            td class=(format!("{TABLE_CELL_STYLE} {gain_style}"))
                            {
                                (signed_currency(holding.gain_loss))
                                " (" (format_percent(holding.gain_loss_percent)) ")"
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                form
                                    hx-post=(format_endpoint(endpoints::INVESTMENT_PRICE, investment.id))
                                    hx-target-error="#alert-container"
                                    class="flex gap-2"
                                {
                                    input
                                        name="current_price"
                                        type="number"
                                        step="0.0001"
                                        min="0"
                                        required
                                        value=(investment.current_price)
                                        aria-label=(format!("Current price of {}", investment.symbol))
                                        class=(FORM_TEXT_INPUT_STYLE);

                                    button type="submit" class="text-blue-600 hover:text-blue-500" { "Update" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn new_investment_form() -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Add Investment" }

            form
                hx-post=(endpoints::INVESTMENTS_API)
                hx-target-error="#alert-container"
                class="space-y-3"
            {
                div class="grid grid-cols-2 gap-2"
                {
                    div
                    {
                        label for="symbol" class=(FORM_LABEL_STYLE) { "Symbol" }
                        input name="symbol" id="symbol" type="text" required class=(FORM_TEXT_INPUT_STYLE);
                    }
                    div
                    {
                        label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                        input name="name" id="name" type="text" required class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="type" id="type" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for kind in InvestmentType::ALL {
                            option value=(kind) { (kind.label()) }
                        }
                    }
                }

                div class="grid grid-cols-3 gap-2"
                {
                    div
                    {
                        label for="shares" class=(FORM_LABEL_STYLE) { "Shares" }
                        input name="shares" id="shares" type="number" step="any" min="0" required class=(FORM_TEXT_INPUT_STYLE);
                    }
                    div
                    {
                        label for="average_cost" class=(FORM_LABEL_STYLE) { "Average Cost" }
                        input name="average_cost" id="average_cost" type="number" step="0.0001" min="0" required class=(FORM_TEXT_INPUT_STYLE);
                    }
                    div
                    {
                        label for="current_price" class=(FORM_LABEL_STYLE) { "Current Price" }
                        input name="current_price" id="current_price" type="number" step="0.0001" min="0" required class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Investment" }
            }
        }
    }
}

fn dividend_form(holdings: &[Holding], today: Date) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Record Dividend" }

            @if holdings.is_empty() {
                p class="text-sm" { "Add an investment before recording dividends." }
            } @else {
                form
                    hx-post=(endpoints::DIVIDENDS_API)
                    hx-target-error="#alert-container"
                    class="space-y-3"
                {
                    div
                    {
                        label for="investment_id" class=(FORM_LABEL_STYLE) { "Investment" }
                        select name="investment_id" id="investment_id" required class=(FORM_TEXT_INPUT_STYLE)
                        {
                            @for holding in holdings {
                                option value=(holding.investment.id) { (holding.investment.symbol) }
                            }
                        }
                    }

                    div class="grid grid-cols-2 gap-2"
                    {
                        div
                        {
                            label for="dividend_amount" class=(FORM_LABEL_STYLE) { "Amount" }
                            input name="amount" id="dividend_amount" type="number" step="0.01" min="0.01" required class=(FORM_TEXT_INPUT_STYLE);
                        }
                        div
                        {
                            label for="payment_date" class=(FORM_LABEL_STYLE) { "Payment Date" }
                            input name="payment_date" id="payment_date" type="date" required value=(today) class=(FORM_TEXT_INPUT_STYLE);
                        }
                    }

                    label class="flex items-center gap-2 text-sm"
                    {
                        input name="reinvested" type="checkbox" value="true";
                        "Reinvested"
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record Dividend" }
                }
            }
        }
    }
}

fn dividends_table(dividends: &[Dividend], holdings: &[Holding]) -> Markup {
    let symbol_of = |investment_id| {
        holdings
            .iter()
            .find(|holding| holding.investment.id == investment_id)
            .map(|holding| holding.investment.symbol.as_str())
            .unwrap_or("?")
    };

    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Dividends" }

            @if dividends.is_empty() {
                p class="text-sm" { "No dividends recorded yet." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Symbol" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Reinvested" }
                        }
                    }
                    tbody
                    {
                        @for dividend in dividends {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (dividend.payment_date) }
                                td class=(TABLE_CELL_STYLE) { (symbol_of(dividend.investment_id)) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(dividend.amount)) }
                                td class=(TABLE_CELL_STYLE) { @if dividend.reinvested { "Yes" } @else { "No" } }
                            }
                        }
                    }
                }
            }
        }
    }
}
