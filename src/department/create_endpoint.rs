use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::User,
    db::lock_connection,
    department::core::{
        Department, DepartmentForm, NewDepartment, create_department, has_department,
    },
    envelope::Envelope,
};

/// The state needed to create a department.
#[derive(Debug, Clone)]
pub struct CreateDepartmentState {
    /// The database connection for managing departments.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateDepartmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a department owned by the logged-in user.
///
/// Users that are not admins may only publish one department.
pub async fn create_department_endpoint(
    State(state): State<CreateDepartmentState>,
    Extension(user): Extension<User>,
    Json(form): Json<DepartmentForm>,
) -> Result<(StatusCode, Json<Envelope<Department>>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    if !user.role.is_elevated() && has_department(user.id, &connection)? {
        return Err(Error::DepartmentAlreadyPublished(user.id));
    }

    let department = create_department(NewDepartment::new(form, user.id)?, &connection)?;

    tracing::info!("User {} created department {}", user.id, department.id);

    Ok((StatusCode::CREATED, Json(Envelope::new(department))))
}

#[cfg(test)]
mod create_department_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn publisher_can_create_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": " Sales ", "description": "Sells things"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Sales");
        assert_eq!(body["data"]["user"], jane.id.as_i64());
    }

    #[tokio::test]
    async fn publisher_cannot_create_second_department() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": "Marketing", "description": "Sells ideas"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": format!("The user with ID {} has already published a department", jane.id)
        }));
    }

    #[tokio::test]
    async fn admin_can_create_many_departments() {
        let app = TestApp::new();
        let admin = app.insert_user("admin@example.com", Role::Admin);
        app.insert_department(&admin, "Sales");
        let cookie = app.log_in("admin@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": "Marketing", "description": "Sells ideas"}))
            .await;

        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn create_requires_log_in() {
        let app = TestApp::new();

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .json(&json!({"name": "Sales", "description": "Sells things"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({
            "success": false,
            "error": "Not authorized to access this route"
        }));
    }

    #[tokio::test]
    async fn create_requires_publisher_role() {
        let app = TestApp::new();
        app.insert_user("jane@example.com", Role::User);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": "Sales", "description": "Sells things"}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({
            "success": false,
            "error": "User role user is not authorized to access this route"
        }));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let app = TestApp::new();
        app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": "Sales"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": "Please add a description"
        }));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        app.insert_department(&jane, "Sales");
        app.insert_user("john@example.com", Role::Publisher);
        let cookie = app.log_in("john@example.com").await;

        let response = app
            .server
            .post(endpoints::DEPARTMENTS)
            .add_cookie(cookie)
            .json(&json!({"name": "Sales", "description": "Sells things"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": "Duplicate field value entered: name"
        }));
    }
}
