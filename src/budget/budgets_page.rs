//! Defines the route handler for the page that lists budgets and their progress.

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
    auth::UserID,
    budget::{BudgetPeriod, BudgetSpending, get_user_budget_spending},
    category::{Category, get_categories_by_kind},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles,
        format_currency, format_percent, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::TransactionType,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    /// The database connection for reading budgets and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the user's budgets with how much of each has been spent.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let (budgets, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let budgets = get_user_budget_spending(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;
        let categories = get_categories_by_kind(TransactionType::Expense, &connection)
            .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

        (budgets, categories)
    };

    Ok(budgets_view(&budgets, &categories, today).into_response())
}

fn budgets_view(budgets: &[BudgetSpending], categories: &[Category], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let over_budget_count = budgets.iter().filter(|budget| budget.is_over_budget()).count();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                div class="flex justify-between items-baseline"
                {
                    h1 class="text-2xl font-bold" { "Budgets" }

                    span class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        (over_budget_count) " of " (budgets.len()) " over budget"
                    }
                }

                @if budgets.is_empty() {
                    p { "No budgets yet. Create one below to start tracking your spending." }
                } @else {
                    div class="grid gap-4 md:grid-cols-2"
                    {
                        @for budget in budgets {
                            (budget_card(budget, categories))
                        }
                    }
                }

                (new_budget_form(categories, today))
            }
        }
    };

    base("Budgets", &[dollar_input_styles()], &content)
}

fn progress_bar(spending: &BudgetSpending) -> Markup {
    let width = spending
        .percentage_used
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .round_dp(1);
    let colour = if spending.is_over_budget() {
        "bg-red-600"
    } else {
        "bg-green-600"
    };

    html! {
        div class="w-full bg-gray-200 rounded-full h-2.5 dark:bg-gray-700"
        {
            div class=(format!("{colour} h-2.5 rounded-full")) style=(format!("width: {width}%")) {}
        }
    }
}

fn budget_card(spending: &BudgetSpending, categories: &[Category]) -> Markup {
    let budget = &spending.budget;
    let budget_endpoint = format_endpoint(endpoints::BUDGET, budget.id);
    let remaining_style = if spending.remaining_budget.is_sign_negative() {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        div class=(CARD_STYLE) data-budget-id=(budget.id)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h3 class="text-lg font-semibold" { (budget.category_name) " Budget" }
                span class="text-xs text-gray-500 dark:text-gray-400"
                {
                    (budget.period) ", " (budget.start_date) " to " (budget.end_date)
                }
            }

            dl class="space-y-1 text-sm mb-3"
            {
                div class="flex justify-between"
                {
                    dt { "Spent" }
                    dd class="font-medium"
                    {
                        (format_currency(spending.total_spent)) " / " (format_currency(budget.amount))
                    }
                }
                div class="flex justify-between"
                {
                    dt { "Remaining" }
                    dd class=(remaining_style)
                    {
                        (format_currency(spending.remaining_budget.abs()))
                        @if spending.remaining_budget.is_sign_negative() {
                            " over budget"
                        }
                    }
                }
                div class="flex justify-between"
                {
                    dt { "Progress" }
                    dd { (format_percent(spending.percentage_used)) }
                }
            }

            (progress_bar(spending))

            details class="mt-4"
            {
                summary class="cursor-pointer text-sm" { "Edit" }

                form
                    hx-put=(budget_endpoint)
                    hx-target-error="#alert-container"
                    class="space-y-3 mt-3"
                {
                    (category_select(categories, Some(budget.category_id)))
                    (amount_input(Some(budget.amount)))
                    (period_select(budget.period))

                    div class="grid grid-cols-2 gap-2"
                    {
                        (date_input("start_date", "Start", budget.start_date))
                        (date_input("end_date", "End", budget.end_date))
                    }

                    button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save" }
                }
            }

            button
                type="button"
                hx-delete=(budget_endpoint)
                hx-confirm=(format!("Delete the {} budget?", budget.category_name))
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete"
            }
        }
    }
}

fn new_budget_form(categories: &[Category], today: Date) -> Markup {
    let (start, end) = current_month_range(today);

    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "New Budget" }

            form
                hx-post=(endpoints::BUDGETS_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                (category_select(categories, None))
                (amount_input(None))
                (period_select(BudgetPeriod::Monthly))

                div class="grid grid-cols-2 gap-2"
                {
                    (date_input("start_date", "Start", start))
                    (date_input("end_date", "End", end))
                }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Create Budget"
                }
            }
        }
    }
}

/// The first and last day of the month containing `today`.
fn current_month_range(today: Date) -> (Date, Date) {
    let start = today.replace_day(1).unwrap_or(today);
    let end = today
        .replace_day(today.month().length(today.year()))
        .unwrap_or(today);

    (start, end)
}

fn category_select(categories: &[Category], selected: Option<i64>) -> Markup {
    html! {
        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category_id" id="category_id" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @if selected.is_none() {
                    option value="" { "Select a category" }
                }

                @for category in categories {
                    option value=(category.id) selected[selected == Some(category.id)]
                    {
                        (category.name)
                    }
                }
            }
        }
    }
}

fn amount_input(value: Option<Decimal>) -> Markup {
    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    value=[value]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn period_select(selected: BudgetPeriod) -> Markup {
    html! {
        div
        {
            label for="period" class=(FORM_LABEL_STYLE) { "Period" }

            select name="period" id="period" required class=(FORM_TEXT_INPUT_STYLE)
            {
                option value=(BudgetPeriod::Monthly) selected[selected == BudgetPeriod::Monthly] { "Monthly" }
                option value=(BudgetPeriod::Annual) selected[selected == BudgetPeriod::Annual] { "Annual" }
            }
        }
    }
}

fn date_input(name: &str, label: &str, value: Date) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                name=(name)
                id=(name)
                type="date"
                required
                value=(value)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
