//! Transactions: amounts recorded against a department by its owner.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod update_endpoint;

pub use core::{Transaction, create_transaction_table, get_transactions_by_department};
pub use create_endpoint::{create_department_transaction_endpoint, create_transaction_endpoint};
pub use delete_endpoint::delete_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::{list_department_transactions_endpoint, list_transactions_endpoint};
pub use update_endpoint::update_transaction_endpoint;

#[cfg(test)]
pub use core::{NewTransaction, TransactionForm, create_transaction};
