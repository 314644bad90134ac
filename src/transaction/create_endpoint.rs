//! Defines the endpoints for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, authorize_owner},
    database_id::DepartmentId,
    db::lock_connection,
    department::get_department,
    envelope::Envelope,
    transaction::core::{NewTransaction, Transaction, TransactionForm, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for adding a transaction to the department in the path.
///
/// Any `department` field in the body is ignored.
pub async fn create_department_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Path(department_id): Path<DepartmentId>,
    Extension(user): Extension<User>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Envelope<Transaction>>), Error> {
    add_transaction(&state, department_id, &user, form)
}

/// A route handler for creating a transaction for the department named in the body.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user): Extension<User>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Envelope<Transaction>>), Error> {
    let department_id = form
        .department
        .ok_or_else(|| Error::Validation(vec!["Please add a department".to_owned()]))?;

    add_transaction(&state, department_id, &user, form)
}

fn add_transaction(
    state: &CreateTransactionState,
    department_id: DepartmentId,
    user: &User,
    form: TransactionForm,
) -> Result<(StatusCode, Json<Envelope<Transaction>>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let department = get_department(department_id, &connection).map_err(|error| match error {
        Error::DepartmentNotFound(id) => Error::MissingDepartment(id),
        error => error,
    })?;

    authorize_owner(
        user,
        department.user,
        &format!("add a transaction to department {department_id}"),
    )?;

    let transaction = NewTransaction::new(form, department_id, user.id)?;
    let transaction = create_transaction(transaction, &connection)?;

    tracing::info!(
        "User {} added transaction {} to department {department_id}",
        user.id,
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(transaction))))
}
