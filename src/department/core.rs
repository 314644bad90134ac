use rusqlite::{Connection, Row, params_from_iter};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    database_id::DepartmentId,
    list_query::{Field, ListQuery},
};

/// The photo a department has until one is uploaded.
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";
const MAX_NAME_LENGTH: usize = 50;
const MAX_DESCRIPTION_LENGTH: usize = 500;

/// The fields of a department that list requests may filter, sort and select on.
pub const DEPARTMENT_FIELDS: &[Field] = &[
    Field {
        name: "id",
        column: "department.id",
    },
    Field {
        name: "name",
        column: "department.name",
    },
    Field {
        name: "description",
        column: "department.description",
    },
    Field {
        name: "photo",
        column: "department.photo",
    },
    Field {
        name: "user",
        column: "department.user_id",
    },
    Field {
        name: "created_at",
        column: "department.created_at",
    },
];

/// A department, owned by the user that published it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Department {
    /// The id for the department.
    pub id: DepartmentId,
    /// The unique name of the department.
    pub name: String,
    /// What the department does.
    pub description: String,
    /// The file name of the department's photo in the upload directory.
    pub photo: String,
    /// The user that published the department.
    pub user: UserID,
    /// When the department was published.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The part of a department shown alongside its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSummary {
    /// The id for the department.
    pub id: DepartmentId,
    /// The unique name of the department.
    pub name: String,
    /// What the department does.
    pub description: String,
}

/// The fields a client sends to create or update a department.
///
/// On update, only the fields that are set are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentForm {
    /// The new name, at most 50 characters once trimmed.
    pub name: Option<String>,
    /// The new description, at most 500 characters.
    pub description: Option<String>,
}

/// A validated department that is ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDepartment {
    name: String,
    description: String,
    user: UserID,
}

impl NewDepartment {
    /// Check the department fields, trimming the name.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every field that is invalid.
    pub fn new(form: DepartmentForm, user: UserID) -> Result<Self, Error> {
        let name = form.name.unwrap_or_default().trim().to_owned();
        let description = form.description.unwrap_or_default();

        validate_fields(&name, &description)?;

        Ok(Self {
            name,
            description,
            user,
        })
    }
}

fn validate_fields(name: &str, description: &str) -> Result<(), Error> {
    let mut messages = Vec::new();

    if name.is_empty() {
        messages.push("Please add a name".to_owned());
    } else if name.chars().count() > MAX_NAME_LENGTH {
        messages.push(format!(
            "Name can not be more than {MAX_NAME_LENGTH} characters"
        ));
    }

    if description.is_empty() {
        messages.push("Please add a description".to_owned());
    } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        messages.push(format!(
            "Description can not be more than {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(messages))
    }
}

pub fn create_department_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS department (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            photo TEXT NOT NULL DEFAULT 'no-photo.jpg',
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_department_user_id ON department(user_id)",
        (),
    )?;

    Ok(())
}

const SELECT_DEPARTMENT: &str =
    "SELECT department.id, department.name, department.description, department.photo, department.user_id, department.created_at FROM department";

pub fn map_department_row(row: &Row) -> Result<Department, rusqlite::Error> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        photo: row.get(3)?,
        user: UserID::new(row.get(4)?),
        created_at: row.get(5)?,
    })
}

/// Insert a department.
///
/// # Errors
/// Returns [Error::DuplicateField] if the name is taken, or [Error::SqlError]
/// if some other SQL error occurred.
pub fn create_department(
    department: NewDepartment,
    connection: &Connection,
) -> Result<Department, Error> {
    connection
        .prepare(
            "INSERT INTO department (name, description, photo, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, description, photo, user_id, created_at",
        )?
        .query_row(
            (
                &department.name,
                &department.description,
                DEFAULT_PHOTO,
                department.user.as_i64(),
                OffsetDateTime::now_utc(),
            ),
            map_department_row,
        )
        .map_err(|error| error.into())
}

/// Get a department by its id.
///
/// # Errors
/// Returns [Error::DepartmentNotFound] if no department has the id.
pub fn get_department(id: DepartmentId, connection: &Connection) -> Result<Department, Error> {
    connection
        .prepare(&format!("{SELECT_DEPARTMENT} WHERE department.id = :id"))?
        .query_row(&[(":id", &id)], map_department_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::DepartmentNotFound(id),
            error => error,
        })
}

/// Whether `user` has published a department.
pub fn has_department(user: UserID, connection: &Connection) -> Result<bool, Error> {
    connection
        .prepare("SELECT EXISTS (SELECT 1 FROM department WHERE user_id = :user_id)")?
        .query_row(&[(":user_id", &user.as_i64())], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Apply the fields set in `changes` to the department with `id`.
///
/// # Errors
/// Returns [Error::DepartmentNotFound] if no department has the id,
/// [Error::Validation] if the merged department is invalid, or
/// [Error::DuplicateField] if the new name is taken.
pub fn update_department(
    id: DepartmentId,
    changes: DepartmentForm,
    connection: &Connection,
) -> Result<Department, Error> {
    let current = get_department(id, connection)?;

    let name = match changes.name {
        Some(name) => name.trim().to_owned(),
        None => current.name,
    };
    let description = changes.description.unwrap_or(current.description);

    validate_fields(&name, &description)?;

    connection
        .prepare(
            "UPDATE department SET name = ?1, description = ?2 WHERE id = ?3
             RETURNING id, name, description, photo, user_id, created_at",
        )?
        .query_row((&name, &description, id), map_department_row)
        .map_err(|error| error.into())
}

/// Record the file name of the department's photo.
///
/// # Errors
/// Returns [Error::DepartmentNotFound] if no department has the id.
pub fn set_department_photo(
    id: DepartmentId,
    photo: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE department SET photo = ?1 WHERE id = ?2",
        (photo, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DepartmentNotFound(id));
    }

    Ok(())
}

/// Delete a department and, through the foreign key, its transactions.
///
/// # Errors
/// Returns [Error::DepartmentNotFound] if no department has the id.
pub fn delete_department(id: DepartmentId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM department WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DepartmentNotFound(id));
    }

    Ok(())
}

/// Get one page of the departments matching `query`, and the number of
/// departments matching `query` across all pages.
pub fn query_departments(
    query: &ListQuery,
    connection: &Connection,
) -> Result<(Vec<Department>, u64), Error> {
    let (where_clause, values) = query.where_clause();

    let total: i64 = connection
        .prepare(&format!("SELECT COUNT(*) FROM department {where_clause}"))?
        .query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    let departments = connection
        .prepare(&format!(
            "{SELECT_DEPARTMENT} {where_clause} {} {}",
            query.order_by_clause(),
            query.limit_clause()
        ))?
        .query_map(params_from_iter(values.iter()), map_department_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((departments, total as u64))
}
