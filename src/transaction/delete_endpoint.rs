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
    envelope::{Empty, Envelope},
    transaction::core::{delete_transaction, get_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Extension(user): Extension<User>,
) -> Result<Json<Envelope<Empty>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = get_transaction(transaction_id, &connection)?;
    authorize_owner(
        &user,
        transaction.user,
        &format!("delete transaction {transaction_id}"),
    )?;

    delete_transaction(transaction_id, &connection)?;

    tracing::info!("User {} deleted transaction {transaction_id}", user.id);

    Ok(Json(Envelope::new(Empty {})))
}

#[cfg(test)]
mod delete_transaction_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn owner_can_delete_transaction() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let pens = app.insert_transaction(&jane, sales, "Pens", 2.0);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, pens))
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"success": true, "data": {}}));
        app.server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, pens))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_publisher_cannot_delete_transaction() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let john = app.insert_user("john@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let pens = app.insert_transaction(&jane, sales, "Pens", 2.0);
        let cookie = app.log_in("john@example.com").await;

        let response = app
            .server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, pens))
            .add_cookie(cookie)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({
            "success": false,
            "error": format!("User {} is not authorized to delete transaction {pens}", john.id)
        }));
    }

    #[tokio::test]
    async fn admin_can_delete_any_transaction() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        app.insert_user("admin@example.com", Role::Admin);
        let sales = app.insert_department(&jane, "Sales");
        let pens = app.insert_transaction(&jane, sales, "Pens", 2.0);
        let cookie = app.log_in("admin@example.com").await;

        app.server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, pens))
            .add_cookie(cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn delete_missing_transaction_is_not_found() {
        let app = TestApp::new();
        app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, 42))
            .add_cookie(cookie)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
