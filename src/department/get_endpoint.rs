use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::DepartmentId,
    db::lock_connection,
    department::core::{Department, get_department},
    envelope::Envelope,
};

/// The state needed to get a department.
#[derive(Debug, Clone)]
pub struct GetDepartmentState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetDepartmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_department_endpoint(
    State(state): State<GetDepartmentState>,
    Path(department_id): Path<DepartmentId>,
) -> Result<Json<Envelope<Department>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_department(department_id, &connection).map(|department| Json(Envelope::new(department)))
}

#[cfg(test)]
mod get_department_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn gets_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");

        let response = app
            .server
            .get(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["id"], sales);
        assert_eq!(body["data"]["name"], "Sales");
        assert_eq!(body["data"]["photo"], "no-photo.jpg");
        assert_eq!(body["data"]["user"], jane.id.as_i64());
    }

    #[tokio::test]
    async fn missing_department_is_not_found() {
        let app = TestApp::new();

        let response = app
            .server
            .get(&endpoints::format_endpoint(endpoints::DEPARTMENT, 42))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({
            "success": false,
            "error": "Department not found with id of 42"
        }));
    }
}
