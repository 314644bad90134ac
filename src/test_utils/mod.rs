#![allow(missing_docs)]

use std::path::Path;

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use crate::{
    AppState,
    auth::{COOKIE_TOKEN, NewUser, PasswordHash, Role, User, create_user},
    config::UploadConfig,
    database_id::{DepartmentId, TransactionId},
    department::{DepartmentForm, NewDepartment, create_department},
    endpoints,
    pagination::PaginationConfig,
    routing::build_router,
    transaction::{NewTransaction, TransactionForm, create_transaction},
};

/// The password of every user created with [TestApp::insert_user].
pub(crate) const TEST_PASSWORD: &str = "correct-horse-battery-staple-42";

/// Keeps test hashing fast.
const TEST_PASSWORD_COST: u32 = 4;

const TEST_MAX_FILE_SIZE: u64 = 1024;

/// The full app served from an in-memory database with uploads going to a temporary directory.
pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = tempfile::tempdir().expect("Could not create upload directory.");
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");

        let mut state = AppState::new(
            connection,
            "foobar",
            PaginationConfig::default(),
            UploadConfig::new(TEST_MAX_FILE_SIZE, upload_dir.path()),
        )
        .expect("Could not create app state.");
        state.password_cost = TEST_PASSWORD_COST;

        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        Self {
            server,
            state,
            upload_dir,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    pub fn insert_user(&self, email: &str, role: Role) -> User {
        let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, &[], TEST_PASSWORD_COST)
            .expect("Could not hash password.");
        let connection = self.state.db_connection.lock().unwrap();

        create_user(
            NewUser {
                name: "Test User".to_owned(),
                email: email.to_owned(),
                role,
                password_hash,
            },
            &connection,
        )
        .expect("Could not create user.")
    }

    pub async fn log_in(&self, email: &str) -> Cookie<'static> {
        let response = self
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": email, "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        response.cookie(COOKIE_TOKEN)
    }

    pub fn insert_department(&self, owner: &User, name: &str) -> DepartmentId {
        let connection = self.state.db_connection.lock().unwrap();
        let department = NewDepartment::new(
            DepartmentForm {
                name: Some(name.to_owned()),
                description: Some("Does things".to_owned()),
            },
            owner.id,
        )
        .expect("Could not validate department.");

        create_department(department, &connection)
            .expect("Could not create department.")
            .id
    }

    pub fn insert_transaction(
        &self,
        owner: &User,
        department: DepartmentId,
        title: &str,
        amount: f64,
    ) -> TransactionId {
        let connection = self.state.db_connection.lock().unwrap();
        let transaction = NewTransaction::new(
            TransactionForm {
                title: Some(title.to_owned()),
                description: Some(format!("{title} for the office")),
                author: Some("Test User".to_owned()),
                amount: Some(amount),
                department: None,
            },
            department,
            owner.id,
        )
        .expect("Could not validate transaction.");

        create_transaction(transaction, &connection)
            .expect("Could not create transaction.")
            .id
    }
}
