//! Displays connected accounts and their balances.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    AppState, Error,
    account::{AccountType, ExternalAccount, get_user_external_accounts, providers_for},
    amount::checked_sum,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, CARD_TITLE_STYLE, CARD_VALUE_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, format_currency,
        loading_spinner,
    },
    navigation::NavBar,
};

/// The state needed for the [get_accounts_page](crate::account::get_accounts_page) route handler.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's connected accounts grouped by type.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_external_accounts(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?
    };

    let total_balance = checked_sum(accounts.iter().map(|account| account.balance))
        .inspect_err(|error| tracing::error!("could not total account balances: {error}"))?;

    Ok(accounts_view(&accounts, total_balance).into_response())
}

fn provider_name(account: &ExternalAccount) -> &str {
    providers_for(account.kind)
        .iter()
        .find(|provider| provider.id == account.provider)
        .map(|provider| provider.name)
        .unwrap_or(account.provider.as_str())
}

fn accounts_view(accounts: &[ExternalAccount], total_balance: Decimal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-screen-xl space-y-6"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }
                }

                div class=(CARD_STYLE) data-total-balance
                {
                    p class=(CARD_TITLE_STYLE) { "Total Balance" }
                    p class=(CARD_VALUE_STYLE) { (format_currency(total_balance)) }
                    p class="text-xs text-gray-500 dark:text-gray-400"
                    {
                        (accounts.len()) " connected accounts"
                    }
                }

                @if accounts.is_empty() {
                    p { "No accounts connected yet. Connect one below to import its transactions." }
                }

                @for kind in AccountType::ALL {
                    @let group: Vec<&ExternalAccount> = accounts
                        .iter()
                        .filter(|account| account.kind == kind)
                        .collect();

                    @if !group.is_empty() {
                        section data-account-type=(kind)
                        {
                            h2 class="text-lg font-semibold mb-2" { (kind.label()) }

                            ul class="grid gap-4 md:grid-cols-2 lg:grid-cols-3"
                            {
                                @for account in group {
                                    (account_card(account))
                                }
                            }
                        }
                    }
                }

                (connect_form())
            }
        }
    );

    base("Accounts", &[], &content)
}

fn account_card(account: &ExternalAccount) -> Markup {
    html!(
        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
            data-account-id=(account.id)
        {
            div class="flex items-start justify-between gap-3"
            {
                div
                {
                    div class="text-sm font-semibold text-gray-900 dark:text-white" { (account.name) }
                    div class="text-xs text-gray-500 dark:text-gray-400"
                    {
                        (provider_name(account)) " •••• " (account.last_four)
                    }
                }

                div class="text-sm tabular-nums text-right text-gray-900 dark:text-white"
                {
                    (format_currency(account.balance))
                }
            }

            button
                type="button"
                hx-post=(endpoints::DISCONNECT_ACCOUNT_API)
                hx-ext="json-enc"
                hx-vals=(format!(r#"{{"accountId": {}}}"#, account.id))
                hx-confirm=(format!(
                    "Disconnect {}? Its imported transactions will be deleted.",
                    account.name
                ))
                hx-target="closest li"
                hx-target-error="#alert-container"
                hx-swap="delete"
                class=(format!("mt-2 text-sm {BUTTON_DELETE_STYLE}"))
            {
                "Disconnect"
            }
        }
    )
}

fn connect_form() -> Markup {
    html!(
        div class=(CARD_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Connect Account" }

            form
                hx-post=(endpoints::CONNECT_ACCOUNT_API)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="space-y-4"
            {
                div
                {
                    label for="type" class=(FORM_LABEL_STYLE) { "Account Type" }
                    select name="type" id="type" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value=(AccountType::Credit) { "Credit Card" }
                        option value=(AccountType::Bank) { "Bank Account" }
                        option value=(AccountType::Investment) { "Investment Account" }
                    }
                }

                div
                {
                    label for="provider" class=(FORM_LABEL_STYLE) { "Provider" }
                    select name="provider" id="provider" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for kind in AccountType::ALL {
                            optgroup label=(kind.label())
                            {
                                @for provider in providers_for(kind) {
                                    option value=(provider.id) { (provider.name) }
                                }
                            }
                        }
                    }
                }

                div
                {
                    label for="account" class=(FORM_LABEL_STYLE) { "Account" }
                    input
                        name="account"
                        id="account"
                        type="text"
                        list="account-names"
                        placeholder="e.g. Sapphire Reserve"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    datalist id="account-names"
                    {
                        @for kind in AccountType::ALL {
                            @for provider in providers_for(kind) {
                                @for name in provider.accounts {
                                    option value=(name) { (provider.name) }
                                }
                            }
                        }
                    }
                }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Connect"
                }
            }
        }
    )
}

#[cfg(test)]
mod accounts_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rust_decimal_macros::dec;
    use scraper::Selector;

    use crate::{
        account::{AccountType, NewExternalAccount, add_external_account},
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            get_test_connection, parse_html_document,
        },
    };

    use super::{AccountsPageState, get_accounts_page};

    #[tokio::test]
    async fn lists_accounts_by_type_with_total() {
        let (conn, user_id) = get_test_connection();
        for (provider, kind, name, balance) in [
            ("amex", AccountType::Credit, "Platinum Card", dec!(150)),
            ("bofa", AccountType::Bank, "Checking", dec!(800.50)),
        ] {
            add_external_account(
                user_id,
                NewExternalAccount {
                    provider: provider.to_owned(),
                    kind,
                    name: name.to_owned(),
                    last_four: "1111".to_owned(),
                    balance,
                },
                &conn,
            )
            .unwrap();
        }
        let state = AccountsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_accounts_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let total: String = document
            .select(&Selector::parse("[data-total-balance]").unwrap())
            .next()
            .expect("want a total balance card")
            .text()
            .collect();
        assert!(total.contains("$950.50"), "got {total}");

        let credit: String = document
            .select(&Selector::parse(r#"section[data-account-type="credit"]"#).unwrap())
            .next()
            .expect("want a credit card section")
            .text()
            .collect();
        assert!(credit.contains("Platinum Card"));
        assert!(credit.contains("American Express"));
        assert!(!credit.contains("Checking"));

        let buttons = document
            .select(&Selector::parse("li[data-account-id] button").unwrap())
            .count();
        assert_eq!(buttons, 2);
    }

    #[tokio::test]
    async fn has_connect_form() {
        let (conn, user_id) = get_test_connection();
        let state = AccountsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_accounts_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let form = document
            .select(&Selector::parse("form").unwrap())
            .next()
            .expect("want the connect form");
        assert_hx_endpoint(&form, endpoints::CONNECT_ACCOUNT_API, "hx-post");
        assert_form_input(&form, "account", "text");
        assert!(
            form.select(&Selector::parse("select[name=provider] option").unwrap())
                .count()
                >= 11
        );
    }
}
