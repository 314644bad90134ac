//! Defines the endpoint for uploading a department's photo.

use std::{
    path::Path as FilePath,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Multipart, Path, State, multipart::Field},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, authorize_owner},
    config::UploadConfig,
    database_id::DepartmentId,
    db::lock_connection,
    department::core::{get_department, set_department_photo},
    envelope::Envelope,
};

/// The name of the multipart field holding the photo.
pub const PHOTO_FIELD: &str = "file";

/// The state needed to upload a department photo.
#[derive(Debug, Clone)]
pub struct UploadPhotoState {
    /// The database connection for managing departments.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where photos are written and how big they may be.
    pub upload_config: UploadConfig,
}

impl FromRef<AppState> for UploadPhotoState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            upload_config: state.upload_config.clone(),
        }
    }
}

/// A photo read from a multipart form.
struct Photo {
    /// The extension of the uploaded file name including the dot, or empty.
    extension: String,
    bytes: Vec<u8>,
}

/// A route handler for uploading a department's photo.
///
/// The photo is stored as `photo_{department_id}{extension}` in the upload
/// directory and the response holds the stored file name.
pub async fn upload_photo_endpoint(
    State(state): State<UploadPhotoState>,
    Path(department_id): Path<DepartmentId>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<Envelope<String>>, Error> {
    {
        let connection = lock_connection(&state.db_connection)?;
        let department = get_department(department_id, &connection)?;
        authorize_owner(&user, department.user, "update this department")?;
    }

    let max_file_size = state.upload_config.max_file_size;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| map_multipart_error(error, max_file_size))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        photo = Some(read_photo(field, max_file_size).await?);
        break;
    }

    let photo = photo.ok_or(Error::MissingFile)?;
    let file_name = format!("photo_{department_id}{}", photo.extension);
    let upload_path = &state.upload_config.upload_path;

    if let Err(error) = tokio::fs::create_dir_all(upload_path).await {
        tracing::error!(
            "Could not create upload directory {}: {error}",
            upload_path.display()
        );
        return Err(Error::FileUploadError);
    }

    if let Err(error) = tokio::fs::write(upload_path.join(&file_name), &photo.bytes).await {
        tracing::error!("Could not write {file_name}: {error}");
        return Err(Error::FileUploadError);
    }

    {
        let connection = lock_connection(&state.db_connection)?;
        set_department_photo(department_id, &file_name, &connection)?;
    }

    tracing::info!(
        "Stored photo {file_name} ({} bytes) for department {department_id}",
        photo.bytes.len()
    );

    Ok(Json(Envelope::new(file_name)))
}

/// Check the content type of `field` and read it, stopping as soon as more than `max_file_size` bytes arrive.
async fn read_photo(mut field: Field<'_>, max_file_size: u64) -> Result<Photo, Error> {
    let is_image = field
        .content_type()
        .is_some_and(|content_type| content_type.starts_with("image"));

    if !is_image {
        return Err(Error::NotAnImage);
    }

    let extension = field
        .file_name()
        .and_then(|file_name| FilePath::new(file_name).extension())
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    let mut bytes = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|error| map_multipart_error(error, max_file_size))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_file_size {
            return Err(Error::FileTooLarge(max_file_size));
        }

        bytes.extend_from_slice(&chunk);
    }

    Ok(Photo { extension, bytes })
}

fn map_multipart_error(error: axum::extract::multipart::MultipartError, max_file_size: u64) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::FileTooLarge(max_file_size);
    }

    tracing::debug!("Could not parse multipart form: {}", error.body_text());
    Error::MultipartError(error.body_text())
}

#[cfg(test)]
mod upload_photo_tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    use super::PHOTO_FIELD;

    fn image_form(file_name: &str, mime_type: &str, size: usize) -> MultipartForm {
        MultipartForm::new().add_part(
            PHOTO_FIELD,
            Part::bytes(vec![7u8; size])
                .file_name(file_name)
                .mime_type(mime_type),
        )
    }

    #[tokio::test]
    async fn stores_valid_photo() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, sales))
            .add_cookie(cookie)
            .multipart(image_form("beach.jpg", "image/jpeg", 128))
            .await;

        response.assert_status_ok();
        let file_name = format!("photo_{sales}.jpg");
        response.assert_json(&json!({"success": true, "data": file_name}));
        let stored = std::fs::read(app.upload_dir().join(&file_name)).unwrap();
        assert_eq!(stored.len(), 128);

        let department = app
            .server
            .get(&endpoints::format_endpoint(endpoints::DEPARTMENT, sales))
            .await
            .json::<Value>();
        assert_eq!(department["data"]["photo"], file_name);

        app.server
            .get(&format!("{}/{file_name}", endpoints::UPLOADS))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn rejects_non_image() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, sales))
            .add_cookie(cookie)
            .multipart(image_form("notes.txt", "text/plain", 16))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"success": false, "error": "Please upload an image file"}));
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;
        let max = app.state.upload_config.max_file_size;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, sales))
            .add_cookie(cookie)
            .multipart(image_form("beach.png", "image/png", max as usize + 1))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "success": false,
            "error": format!("Please upload an image less than {max}")
        }));
        assert!(!app.upload_dir().join(format!("photo_{sales}.png")).exists());
    }

    #[tokio::test]
    async fn rejects_form_without_file() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, sales))
            .add_cookie(cookie)
            .multipart(MultipartForm::new().add_text("caption", "A beach"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"success": false, "error": "Please upload a file"}));
    }

    #[tokio::test]
    async fn other_publisher_cannot_upload() {
        let app = TestApp::new();
        let jane = app.insert_user("jane@example.com", Role::Publisher);
        let john = app.insert_user("john@example.com", Role::Publisher);
        let sales = app.insert_department(&jane, "Sales");
        let cookie = app.log_in("john@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, sales))
            .add_cookie(cookie)
            .multipart(image_form("beach.jpg", "image/jpeg", 16))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({
            "success": false,
            "error": format!("User {} is not authorized to update this department", john.id)
        }));
    }

    #[tokio::test]
    async fn missing_department_is_not_found() {
        let app = TestApp::new();
        app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app
            .server
            .put(&endpoints::format_endpoint(endpoints::DEPARTMENT_PHOTO, 42))
            .add_cookie(cookie)
            .multipart(image_form("beach.jpg", "image/jpeg", 16))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
