use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState, Error,
    database_id::DepartmentId,
    db::lock_connection,
    department::core::{DEPARTMENT_FIELDS, query_departments},
    envelope::ListEnvelope,
    list_query::ListQuery,
    pagination::PaginationConfig,
    transaction::{Transaction, get_transactions_by_department},
};

/// The state needed to list departments.
#[derive(Debug, Clone)]
pub struct ListDepartmentsState {
    /// The database connection for reading departments.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how the list is paged.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListDepartmentsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for listing departments along with their transactions.
///
/// Supports the filter, sort, select and paging parameters of [ListQuery].
pub async fn list_departments_endpoint(
    State(state): State<ListDepartmentsState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ListEnvelope<Value>>, Error> {
    let query = ListQuery::parse(&params, DEPARTMENT_FIELDS, &state.pagination_config)?;

    let (departments, total, transactions) = {
        let connection = lock_connection(&state.db_connection)?;
        let (departments, total) = query_departments(&query, &connection)?;
        let ids: Vec<DepartmentId> = departments.iter().map(|department| department.id).collect();
        let transactions = get_transactions_by_department(&ids, &connection)?;

        (departments, total, transactions)
    };

    let mut transactions_by_department: HashMap<DepartmentId, Vec<Transaction>> = HashMap::new();
    for transaction in transactions {
        transactions_by_department
            .entry(transaction.department)
            .or_default()
            .push(transaction);
    }

    let ids: Vec<DepartmentId> = departments.iter().map(|department| department.id).collect();
    let mut items = query.project(departments)?;

    for (id, item) in ids.into_iter().zip(items.iter_mut()) {
        let transactions = transactions_by_department.remove(&id).unwrap_or_default();
        let transactions = serde_json::to_value(transactions)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

        if let Value::Object(map) = item {
            map.insert("transactions".to_owned(), transactions);
        }
    }

    Ok(Json(ListEnvelope::paginated(
        items,
        query.pagination(total),
    )))
}

#[cfg(test)]
mod list_departments_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn lists_departments_with_their_transactions() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let john = app.insert_user("john@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let marketing = app.insert_department(&john, "Marketing");
        app.insert_transaction(&jane, sales, "Pens", 2.0);
        app.insert_transaction(&jane, sales, "Ink", 3.0);
        app.insert_transaction(&john, marketing, "Ads", 9.0);

        let response = app
            .server
            .get(endpoints::DEPARTMENTS)
            .add_query_param("sort", "name")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        assert_eq!(body["pagination"], json!({}));
        assert_eq!(body["data"][0]["name"], "Marketing");
        assert_eq!(body["data"][0]["transactions"][0]["title"], "Ads");
        assert_eq!(body["data"][1]["name"], "Sales");
        let titles: Vec<_> = body["data"][1]["transactions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["title"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(titles, ["Pens", "Ink"]);
    }

    #[tokio::test]
    async fn select_limits_fields() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");

        let response = app
            .server
            .get(endpoints::DEPARTMENTS)
            .add_query_param("select", "name")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>()["data"][0],
            json!({"id": sales, "name": "Sales", "transactions": []})
        );
    }

    #[tokio::test]
    async fn paginates_departments() {
        let app = TestApp::new();
        for (email, name) in [
            ("a@example.com", "A"),
            ("b@example.com", "B"),
            ("c@example.com", "C"),
        ] {
            let user = app.insert_user(email, Role::Publisher);
            app.insert_department(&user, name);
        }

        let response = app
            .server
            .get(&format!("{}?sort=name&page=2&limit=1", endpoints::DEPARTMENTS))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["name"], "B");
        assert_eq!(
            body["pagination"],
            json!({"next": {"page": 3, "limit": 1}, "prev": {"page": 1, "limit": 1}})
        );
    }

    #[tokio::test]
    async fn filters_departments_by_owner() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let john = app.insert_user("john@example.com", Role::Publisher);
        app.insert_department(&jane, "Sales");
        app.insert_department(&john, "Marketing");

        let response = app
            .server
            .get(endpoints::DEPARTMENTS)
            .add_query_param("user", john.id.as_i64())
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["name"], "Marketing");
    }

    #[tokio::test]
    async fn rejects_unknown_fields() {
        let app = TestApp::new();

        let response = app
            .server
            .get(endpoints::DEPARTMENTS)
            .add_query_param("colour", "red")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": "Invalid query: unknown field \"colour\""
        }));
    }

    #[tokio::test]
    async fn rejects_page_past_largest_offset() {
        let app = TestApp::new();

        let response = app
            .server
            .get(endpoints::DEPARTMENTS)
            .add_query_param("page", "100000000000000000")
            .add_query_param("limit", 100)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": "Invalid query: page 100000000000000000 is out of range"
        }));
    }
}
