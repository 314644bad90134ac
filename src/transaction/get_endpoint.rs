use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    db::lock_connection,
    department::DepartmentSummary,
    envelope::Envelope,
    transaction::core::{Transaction, get_transaction_with_department},
};

/// The state needed to get a transaction.
#[derive(Debug, Clone)]
pub struct GetTransactionState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting a transaction with a summary of its department.
pub async fn get_transaction_endpoint(
    State(state): State<GetTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Envelope<Transaction<DepartmentSummary>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction_with_department(transaction_id, &connection)
        .map(|transaction| Json(Envelope::new(transaction)))
}

#[cfg(test)]
mod get_transaction_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn gets_transaction_with_department_summary() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let pens = app.insert_transaction(&jane, sales, "Pens", 2.5);

        let response = app
            .server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, pens))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], pens);
        assert_eq!(body["data"]["title"], "Pens");
        assert_eq!(body["data"]["amount"], 2.5);
        assert_eq!(body["data"]["user"], jane.id.as_i64());
        assert_eq!(
            body["data"]["department"],
            json!({"id": sales, "name": "Sales", "description": "Does things"})
        );
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let app = TestApp::new();

        let response = app
            .server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, 42))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({
            "success": false,
            "error": "No transaction with the id of 42"
        }));
    }
}
