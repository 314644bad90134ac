//! Defines the endpoint for updating a department.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, authorize_owner},
    database_id::DepartmentId,
    db::lock_connection,
    department::core::{Department, DepartmentForm, get_department, update_department},
    envelope::Envelope,
};

/// The state needed to update a department.
#[derive(Debug, Clone)]
pub struct UpdateDepartmentState {
    /// The database connection for managing departments.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateDepartmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for changing the name or description of a department.
///
/// Only the owner of the department or an admin may change it.
pub async fn update_department_endpoint(
    State(state): State<UpdateDepartmentState>,
    Path(department_id): Path<DepartmentId>,
    Extension(user): Extension<User>,
    Json(form): Json<DepartmentForm>,
) -> Result<Json<Envelope<Department>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let department = get_department(department_id, &connection)?;
    authorize_owner(&user, department.user, "update this department")?;

    let department = update_department(department_id, form, &connection)?;

    Ok(Json(Envelope::new(department)))
}

#[cfg(test)]
mod update_department_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn owner_can_update_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .add_cookie(cookie)
            .json(&json!({"description": "Sells more things"}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["name"], "Sales");
        assert_eq!(body["data"]["description"], "Sells more things");
    }

    #[tokio::test]
    async fn other_publisher_cannot_update_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let john = app.insert_user("john@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("john@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .add_cookie(cookie)
            .json(&json!({"description": "Mine now"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({
            "success": false,
            "error": format!("User {} is not authorized to update this department", john.id)
        }));
    }

    #[tokio::test]
    async fn admin_can_update_any_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        app.insert_user("admin@example.com", Role::Admin);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("admin@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .add_cookie(cookie)
            .json(&json!({"name": "Big Sales"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["name"], "Big Sales");
    }

    #[tokio::test]
    async fn update_missing_department_is_not_found() {
        let app = TestApp::new();
        app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT, 42))
            .add_cookie(cookie)
            .json(&json!({"name": "Sales"}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_revalidates_fields() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .add_cookie(cookie)
            .json(&json!({"name": "x".repeat(51)}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": "Name can not be more than 50 characters"
        }));
    }
}
