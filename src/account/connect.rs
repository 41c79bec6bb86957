//! Connecting an external account and filling it with generated data.

use rand::Rng;
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    account::{
        AccountType, ExternalAccount, NewExternalAccount, add_external_account, find_provider,
        generate_balance, generate_last_four, generate_mock_investments,
        generate_mock_transactions,
    },
    auth::UserID,
    investment::add_investment,
    transaction::insert_external_transactions,
};

/// Link a `kind` account called `name` at `provider` to the user.
///
/// The account gets a random balance and account number, between 30 and 49
/// transactions from the 90 days up to `today`, and investment accounts also
/// get a portfolio of holdings.
///
/// Everything is stored in one SQL transaction, so a failure leaves no
/// partially connected account behind.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidProvider] if `provider` does not offer `kind` accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn connect_external_account<R: Rng + ?Sized>(
    user_id: UserID,
    kind: AccountType,
    provider: &str,
    name: &str,
    today: Date,
    rng: &mut R,
    connection: &Connection,
) -> Result<ExternalAccount, Error> {
    if find_provider(kind, provider).is_none() {
        return Err(Error::InvalidProvider(provider.to_owned()));
    }

    let sql_transaction = connection.unchecked_transaction()?;

    let account = add_external_account(
        user_id,
        NewExternalAccount {
            provider: provider.to_owned(),
            kind,
            name: name.to_owned(),
            last_four: generate_last_four(rng),
            balance: generate_balance(kind, rng),
        },
        &sql_transaction,
    )?;

    let transactions = generate_mock_transactions(kind, today, rng);
    let imported =
        insert_external_transactions(user_id, account.id, &transactions, &sql_transaction)?;
    tracing::debug!(
        "imported {} transactions into account {}",
        imported.len(),
        account.id
    );

    if kind == AccountType::Investment {
        for investment in generate_mock_investments(provider, rng) {
            add_investment(user_id, investment, &sql_transaction)?;
        }
    }

    sql_transaction.commit()?;

    Ok(account)
}
