//! Defines the endpoint for updating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, authorize_owner},
    database_id::TransactionId,
    db::lock_connection,
    envelope::Envelope,
    transaction::core::{Transaction, TransactionForm, get_transaction, update_transaction},
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for changing the fields of a transaction.
///
/// A transaction cannot be moved to another department.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Extension(user): Extension<User>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Envelope<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = get_transaction(transaction_id, &connection)?;
    authorize_owner(
        &user,
        transaction.user,
        &format!("update transaction {transaction_id}"),
    )?;

    let transaction = update_transaction(transaction_id, form, &connection)?;

    Ok(Json(Envelope::new(transaction)))
}
