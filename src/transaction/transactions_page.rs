//! Defines the route handler for the page that displays transactions as a table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        CardTone, DashboardChart, cards_grid, chart_head_elements, charts_view,
        income_expenses_chart, monthly_totals, summarize_month, summary_card,
    },
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, TransactionType, get_user_transactions},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the user's transaction history with this month's totals.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let this_month = summarize_month(&transactions, today)
        .inspect_err(|error| tracing::error!("could not total this month's transactions: {error}"))?;
    let cards = [
        summary_card(
            "Monthly Income",
            &format_currency(this_month.income),
            "This month",
            CardTone::Positive,
        ),
        summary_card(
            "Monthly Expenses",
            &format_currency(this_month.expenses),
            "This month",
            CardTone::Negative,
        ),
    ];
    let charts = [DashboardChart {
        id: "monthly-overview-chart",
        options: income_expenses_chart(&monthly_totals(&transactions)?).to_string(),
    }];

    Ok(transactions_view(&cards, &charts, &transactions).into_response())
}

fn transactions_view(cards: &[Markup], charts: &[DashboardChart], transactions: &[Transaction]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                div class="flex justify-between items-center mb-4"
                {
                    h1 class="text-2xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Add Transaction"
                    }
                }

                (cards_grid(cards))

                @if transactions.is_empty() {
                    p
                    {
                        "No transactions yet. "
                        (link(endpoints::NEW_TRANSACTION_VIEW, "Add one"))
                        " or connect an account on the "
                        (link(endpoints::ACCOUNTS_VIEW, "accounts page"))
                        "."
                    }
                } @else {
                    (charts_view(charts))
                    (transactions_table(transactions, true))
                }
            }
        }
    };

    base("Transactions", &chart_head_elements(charts), &content)
}

/// A table of transactions, newest first.
///
/// When `allow_delete` is set, manually entered transactions get a delete
/// button. Imported transactions can never be deleted individually.
pub(crate) fn transactions_table(transactions: &[Transaction], allow_delete: bool) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md sm:rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        @if allow_delete {
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.date) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (transaction.description)
                                @if transaction.is_external {
                                    " "
                                    span class=(BADGE_STYLE) { "Imported" }
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (transaction.category) } }
                            td class=(format!("{TABLE_CELL_STYLE} {}", amount_colour(transaction.kind)))
                            {
                                (format_currency(transaction.amount))
                            }
                            @if allow_delete {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if !transaction.is_external {
                                        button
                                            type="button"
                                            hx-post=(endpoints::DELETE_TRANSACTION_API)
                                            hx-ext="json-enc"
                                            hx-vals=(format!(r#"{{"transactionId": {}}}"#, transaction.id))
                                            hx-confirm="Delete this transaction?"
                                            hx-target="closest tr"
                                            hx-target-error="#alert-container"
                                            hx-swap="delete"
                                            class=(BUTTON_DELETE_STYLE)
                                        {
                                            "Delete"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn amount_colour(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
    }
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rust_decimal_macros::dec;
    use scraper::Selector;
    use time::{Duration, OffsetDateTime};

    use crate::{
        account::{AccountType, NewExternalAccount, add_external_account},
        test_utils::{
            assert_content_type, assert_status_ok, assert_valid_html, get_test_connection,
            parse_html_document,
        },
        transaction::{NewTransaction, TransactionType, add_external_transactions, add_transaction},
    };

    use super::{TransactionsPageState, get_transactions_page};

    #[tokio::test]
    async fn shows_transactions_with_delete_only_for_manual_ones() {
        let (conn, user_id) = get_test_connection();
        let today = OffsetDateTime::now_utc().date();
        add_transaction(
            user_id,
            NewTransaction::new(dec!(12.30), "Lunch", "Food", TransactionType::Expense).date(today),
            &conn,
        )
        .unwrap();
        let account = add_external_account(
            user_id,
            NewExternalAccount {
                provider: "chase".to_owned(),
                kind: AccountType::Bank,
                name: "Checking".to_owned(),
                last_four: "1111".to_owned(),
                balance: dec!(100),
            },
            &conn,
        )
        .unwrap();
        add_external_transactions(
            user_id,
            account.id,
            &[NewTransaction::new(dec!(3000), "Payroll", "Direct Deposit", TransactionType::Income)
                .date(today - Duration::days(1))],
            &conn,
        )
        .unwrap();
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_transactions_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let rows = document
            .select(&Selector::parse("tbody tr").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        let delete_buttons = document
            .select(&Selector::parse("tbody button[hx-post]").unwrap())
            .count();
        assert_eq!(delete_buttons, 1, "only the manual transaction can be deleted");
        let text: String = document.root_element().text().collect();
        assert!(text.contains("-$12.30"));
        assert!(text.contains("Payroll"));
    }

    #[tokio::test]
    async fn empty_state_has_no_table() {
        let (conn, user_id) = get_test_connection();
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_transactions_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(document.select(&Selector::parse("table").unwrap()).count(), 0);
    }
}
