//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a row in the transaction table.
pub type TransactionId = DatabaseId;
/// The ID of a row in the category table.
pub type CategoryId = DatabaseId;
/// The ID of a row in the budget table.
pub type BudgetId = DatabaseId;
/// The ID of a row in the external account table.
pub type AccountId = DatabaseId;
/// The ID of a row in the investment table.
pub type InvestmentId = DatabaseId;
/// The ID of a row in the dividend table.
pub type DividendId = DatabaseId;
