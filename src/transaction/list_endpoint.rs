use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, Error,
    database_id::DepartmentId,
    db::lock_connection,
    envelope::ListEnvelope,
    list_query::ListQuery,
    pagination::PaginationConfig,
    transaction::core::{
        TRANSACTION_FIELDS, Transaction, get_transactions_by_department, query_transactions,
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how the list is paged.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for listing transactions with a summary of their departments.
///
/// Supports the filter, sort, select and paging parameters of [ListQuery].
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ListEnvelope<Value>>, Error> {
    let query = ListQuery::parse(&params, TRANSACTION_FIELDS, &state.pagination_config)?;

    let (transactions, total) = {
        let connection = lock_connection(&state.db_connection)?;
        query_transactions(&query, &connection)?
    };

    Ok(Json(ListEnvelope::paginated(
        query.project(transactions)?,
        query.pagination(total),
    )))
}

/// A route handler for listing every transaction of one department.
///
/// The list is neither filtered nor paged.
pub async fn list_department_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Path(department_id): Path<DepartmentId>,
) -> Result<Json<ListEnvelope<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transactions = get_transactions_by_department(&[department_id], &connection)?;

    Ok(Json(ListEnvelope::new(transactions)))
}
