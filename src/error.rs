//! Defines the app level error type and its conversion into JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    auth::{Role, UserID},
    database_id::{DepartmentId, TransactionId},
    envelope::ErrorBody,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("Not authorized to access this route")]
    NotAuthenticated,

    /// The authenticated user's role is not allowed to use the route.
    #[error("User role {0} is not authorized to access this route")]
    RoleNotAuthorized(Role),

    /// The authenticated user neither owns the resource nor has an elevated role.
    ///
    /// The string is the full message shown to the client, e.g.
    /// "User 3 is not authorized to update this department".
    #[error("{0}")]
    NotOwner(String),

    /// The user provided a password that is too easy to guess.
    #[error("Please add a stronger password: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is already registered to another user.
    #[error("Duplicate field value entered: email")]
    DuplicateEmail,

    /// A unique field (e.g. a department name) already holds the value.
    #[error("Duplicate field value entered: {0}")]
    DuplicateField(String),

    /// A foreign key did not refer to an existing record.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// One or more fields failed validation.
    ///
    /// Each entry is a message for one field, e.g. "Please add a description".
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// The list query string could not be interpreted.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A non-admin user tried to create a second department.
    #[error("The user with ID {0} has already published a department")]
    DepartmentAlreadyPublished(UserID),

    /// The department with the given ID does not exist.
    #[error("Department not found with id of {0}")]
    DepartmentNotFound(DepartmentId),

    /// The department referenced by a new transaction does not exist.
    #[error("No department with the id of {0}")]
    MissingDepartment(DepartmentId),

    /// The transaction with the given ID does not exist.
    #[error("No transaction with the id of {0}")]
    TransactionNotFound(TransactionId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Resource not found")]
    NotFound,

    /// The multipart form did not contain a file.
    #[error("Please upload a file")]
    MissingFile,

    /// The uploaded file does not have an image MIME type.
    #[error("Please upload an image file")]
    NotAnImage,

    /// The uploaded file is larger than the configured maximum, in bytes.
    #[error("Please upload an image less than {0}")]
    FileTooLarge(u64),

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded file could not be written to the upload directory.
    #[error("Problem with file upload")]
    FileUploadError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) => {
                if desc.ends_with("user.email") {
                    Error::DuplicateEmail
                } else {
                    // The description looks like "UNIQUE constraint failed: department.name".
                    let field = desc.rsplit('.').next().unwrap_or(desc).to_owned();
                    Error::DuplicateField(field)
                }
            }
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference("the referenced record does not exist".to_owned()),
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::NotAuthenticated | Error::NotOwner(_) => {
                StatusCode::UNAUTHORIZED
            }
            Error::RoleNotAuthorized(_) => StatusCode::FORBIDDEN,
            Error::DepartmentNotFound(_)
            | Error::MissingDepartment(_)
            | Error::TransactionNotFound(_)
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::TooWeak(_)
            | Error::DuplicateEmail
            | Error::DuplicateField(_)
            | Error::InvalidReference(_)
            | Error::Validation(_)
            | Error::InvalidQuery(_)
            | Error::DepartmentAlreadyPublished(_)
            | Error::MissingFile
            | Error::NotAnImage
            | Error::FileTooLarge(_)
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::FileUploadError
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => {
                // These errors are not intended to be shown to the client.
                tracing::error!("An unexpected error occurred: {}", self);
                "Server Error".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
