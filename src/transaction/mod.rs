//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` builder
//! - Database functions for storing, querying, and deleting transactions
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod transactions_page;

pub use core::{
    NewTransaction, Transaction, TransactionType, add_external_transactions, add_transaction,
    create_transaction_table, delete_transaction, get_account_transactions, get_transaction,
    get_user_transactions,
};
pub(crate) use core::insert_external_transactions;
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use transactions_page::get_transactions_page;
pub(crate) use transactions_page::transactions_table;
