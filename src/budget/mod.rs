//! Budgets: spending limits per category and the spending measured against them.

mod budgets_page;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod spending;

pub use budgets_page::get_budgets_page;
pub use core::{
    Budget, BudgetPeriod, BudgetUpdate, NewBudget, add_budget, create_budget_table, delete_budget,
    get_budget, get_user_budgets, update_budget,
};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use spending::{
    BudgetSpending, calculate_budget_spending, get_budget_spending, get_user_budget_spending,
};
