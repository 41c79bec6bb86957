//! The institutions that accounts can be connected from.

use crate::account::AccountType;

/// A financial institution and the account products it offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// The identifier stored with connected accounts.
    pub id: &'static str,
    /// The display name.
    pub name: &'static str,
    /// The account products that can be connected.
    pub accounts: &'static [&'static str],
}

const CREDIT_PROVIDERS: &[Provider] = &[
    Provider {
        id: "amex",
        name: "American Express",
        accounts: &["Platinum Card", "Gold Card", "Blue Cash"],
    },
    Provider {
        id: "chase",
        name: "Chase",
        accounts: &["Sapphire Reserve", "Freedom Unlimited", "Ink Business"],
    },
    Provider {
        id: "citi",
        name: "Citi",
        accounts: &["Double Cash", "Premier", "Custom Cash"],
    },
];

const BANK_PROVIDERS: &[Provider] = &[
    Provider {
        id: "chase",
        name: "Chase",
        accounts: &["Checking", "Savings"],
    },
    Provider {
        id: "bofa",
        name: "Bank of America",
        accounts: &["Checking", "Savings", "Business"],
    },
    Provider {
        id: "wells",
        name: "Wells Fargo",
        accounts: &["Everyday Checking", "Way2Save"],
    },
];

const INVESTMENT_PROVIDERS: &[Provider] = &[
    Provider {
        id: "fidelity",
        name: "Fidelity",
        accounts: &["Investment Account", "Roth IRA", "401(k)"],
    },
    Provider {
        id: "vanguard",
        name: "Vanguard",
        accounts: &["Brokerage", "Roth IRA", "Traditional IRA"],
    },
    Provider {
        id: "schwab",
        name: "Charles Schwab",
        accounts: &["Brokerage", "Retirement", "Checking"],
    },
    Provider {
        id: "robinhood",
        name: "Robinhood",
        accounts: &["Individual Investing", "Retirement"],
    },
    Provider {
        id: "coinbase",
        name: "Coinbase",
        accounts: &["Crypto Wallet", "Vault"],
    },
];

/// The providers that offer accounts of `kind`.
pub fn providers_for(kind: AccountType) -> &'static [Provider] {
    match kind {
        AccountType::Credit => CREDIT_PROVIDERS,
        AccountType::Bank => BANK_PROVIDERS,
        AccountType::Investment => INVESTMENT_PROVIDERS,
    }
}

/// Look up a provider of `kind` accounts by its identifier.
pub fn find_provider(kind: AccountType, id: &str) -> Option<&'static Provider> {
    providers_for(kind).iter().find(|provider| provider.id == id)
}
