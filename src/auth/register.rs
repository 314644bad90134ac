//! The route handler for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{NewUser, PasswordHash, Role, User, create_user, set_auth_cookie},
    db::lock_connection,
    envelope::Envelope,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used to hash new passwords.
    pub password_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent by the client to register.
#[derive(Clone, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Create a user and log them in.
///
/// Only the `user` and `publisher` roles may be chosen here, admins are
/// created with the `create_user` binary.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, PrivateCookieJar, Json<Envelope<User>>), Error> {
    let role = form.role.unwrap_or_default();

    if role.is_elevated() {
        return Err(Error::Validation(vec![format!(
            "Role {role} cannot be chosen at registration"
        )]));
    }

    let Some(password) = form.password else {
        return Err(Error::Validation(vec!["Please add a password".to_owned()]));
    };

    let new_user = NewUser {
        name: form.name.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        role,
        password_hash: PasswordHash::from_stored(""),
    }
    .validate()?;

    let password_hash = PasswordHash::from_raw_password(
        &password,
        &[new_user.name.as_str(), new_user.email.as_str()],
        state.password_cost,
    )?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        create_user(
            NewUser {
                password_hash,
                ..new_user
            },
            &connection,
        )?
    };

    tracing::info!("Registered user {} with role {}", user.id, user.role);

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((StatusCode::CREATED, jar, Json(Envelope::new(user))))
}
