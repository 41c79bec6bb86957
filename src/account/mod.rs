//! External accounts: linking accounts from banks, card issuers and brokers.

mod accounts_page;
mod connect;
mod connect_endpoint;
mod core;
mod disconnect_endpoint;
mod mock;
mod providers;

pub use accounts_page::get_accounts_page;
pub use connect::connect_external_account;
pub use connect_endpoint::connect_account_endpoint;
pub use core::{
    AccountType, ExternalAccount, NewExternalAccount, add_external_account,
    create_external_account_table, disconnect_external_account, get_external_account,
    get_total_external_balance, get_user_external_accounts,
};
pub use disconnect_endpoint::disconnect_account_endpoint;
pub use mock::{
    generate_balance, generate_last_four, generate_mock_investments, generate_mock_transactions,
};
pub use providers::{Provider, find_provider, providers_for};
