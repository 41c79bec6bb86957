//! Works out how much of a budget has been spent.

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error,
    amount::{checked_percent, checked_sub, checked_sum},
    auth::UserID,
    budget::{Budget, get_user_budgets},
    transaction::{Transaction, TransactionType, get_user_transactions},
};

/// A budget together with the spending against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSpending {
    pub budget: Budget,
    /// The sum of matching expenses, as a positive number.
    pub total_spent: Decimal,
    /// How much is left, negative once the budget is exceeded.
    pub remaining_budget: Decimal,
    /// `total_spent` as a percentage of the budget amount.
    ///
    /// `None` when the budget amount is zero.
    pub percentage_used: Option<Decimal>,
}

impl BudgetSpending {
    /// Whether more than 100% of the budget has been spent.
    pub fn is_over_budget(&self) -> bool {
        self.percentage_used
            .is_some_and(|percentage| percentage > Decimal::ONE_HUNDRED)
    }
}

/// Compare a budget against the expenses in its category and date range.
///
/// Only expenses dated between the budget's start and end dates (inclusive)
/// whose category matches the budget's category are counted.
///
/// # Errors
/// Returns [Error::ArithmeticOverflow] if the spending is too large to total.
pub fn calculate_budget_spending(
    budget: Budget,
    transactions: &[Transaction],
) -> Result<BudgetSpending, Error> {
    let total_spent = checked_sum(
        transactions
            .iter()
            .filter(|transaction| {
                transaction.kind == TransactionType::Expense
                    && transaction.category == budget.category_name
                    && (budget.start_date..=budget.end_date).contains(&transaction.date)
            })
            .map(|transaction| transaction.amount.abs()),
    )?;

    Ok(BudgetSpending {
        remaining_budget: checked_sub(budget.amount, total_spent)?,
        percentage_used: checked_percent(total_spent, budget.amount),
        total_spent,
        budget,
    })
}

/// Fetch the user's transactions and work out the spending against `budget`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or
/// [Error::ArithmeticOverflow] if the spending is too large to total.
pub fn get_budget_spending(
    user_id: UserID,
    budget: Budget,
    connection: &Connection,
) -> Result<BudgetSpending, Error> {
    let transactions = get_user_transactions(user_id, connection)?;

    calculate_budget_spending(budget, &transactions)
}

/// Get every one of the user's budgets with the spending against it.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error, or
/// [Error::ArithmeticOverflow] if the spending is too large to total.
pub fn get_user_budget_spending(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetSpending>, Error> {
    let budgets = get_user_budgets(user_id, connection)?;
    let transactions = get_user_transactions(user_id, connection)?;

    budgets
        .into_iter()
        .map(|budget| calculate_budget_spending(budget, &transactions))
        .collect()
}
