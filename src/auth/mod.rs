//! Users, passwords, auth cookies and the middleware that authenticates requests.

mod authorize;
mod cookie;
mod log_in;
mod log_out;
mod me;
mod middleware;
mod password;
mod register;
mod role;
mod token;
mod user;

pub use authorize::authorize_owner;
pub use cookie::{
    COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use me::get_me;
pub use middleware::{AuthState, auth_guard, publisher_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_user;
pub use role::Role;
pub use user::{
    NewUser, User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id,
};
