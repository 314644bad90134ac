//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/departments/{department_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/v1/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/v1/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/v1/auth/logout";
/// The route for getting the logged-in user.
pub const ME: &str = "/api/v1/auth/me";
/// The route to list and create departments.
pub const DEPARTMENTS: &str = "/api/v1/departments";
/// The route to access a single department.
pub const DEPARTMENT: &str = "/api/v1/departments/{department_id}";
/// The route to upload a department's photo.
pub const DEPARTMENT_PHOTO: &str = "/api/v1/departments/{department_id}/photo";
/// The route to list and create the transactions of a department.
pub const DEPARTMENT_TRANSACTIONS: &str = "/api/v1/departments/{department_id}/transactions";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
/// The route for uploaded department photos.
pub const UPLOADS: &str = "/uploads";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
