//! Log-out route handler that invalidates authentication cookies.

use axum::Json;
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::invalidate_auth_cookie,
    envelope::{Empty, Envelope},
};

/// Invalidate the auth cookie.
pub async fn get_log_out(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Envelope<Empty>>) {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(Envelope::new(Empty {})))
}
