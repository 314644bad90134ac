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
    department::core::{delete_department, get_department},
    envelope::{Empty, Envelope},
};

/// The state needed to delete a department.
#[derive(Debug, Clone)]
pub struct DeleteDepartmentState {
    /// The database connection for managing departments.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteDepartmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a department and its transactions.
pub async fn delete_department_endpoint(
    State(state): State<DeleteDepartmentState>,
    Path(department_id): Path<DepartmentId>,
    Extension(user): Extension<User>,
) -> Result<Json<Envelope<Empty>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let department = get_department(department_id, &connection)?;
    authorize_owner(&user, department.user, "delete this department")?;

    delete_department(department_id, &connection)?;

    tracing::info!("User {} deleted department {department_id}", user.id);

    Ok(Json(Envelope::new(Empty {})))
}
