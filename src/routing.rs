//! Application router configuration with public, authenticated and publisher-only route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    auth::{auth_guard, get_log_out, get_me, post_log_in, publisher_guard, register_user},
    department::{
        create_department_endpoint, delete_department_endpoint, get_department_endpoint,
        list_departments_endpoint, update_department_endpoint, upload_photo_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    transaction::{
        create_department_transaction_endpoint, create_transaction_endpoint,
        delete_transaction_endpoint, get_transaction_endpoint,
        list_department_transactions_endpoint, list_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Room for the multipart boundaries and headers around an uploaded photo.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::DEPARTMENTS, get(list_departments_endpoint))
        .route(endpoints::DEPARTMENT, get(get_department_endpoint))
        .route(
            endpoints::DEPARTMENT_TRANSACTIONS,
            get(list_department_transactions_endpoint),
        )
        .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint));

    let authenticated_routes = Router::new()
        .route(endpoints::ME, get(get_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let photo_body_limit =
        usize::try_from(state.upload_config.max_file_size).unwrap_or(usize::MAX);
    let photo_body_limit = photo_body_limit.saturating_add(MULTIPART_OVERHEAD);

    // The auth guard is added last so that it runs before the publisher guard.
    let publisher_routes = Router::new()
        .route(endpoints::DEPARTMENTS, post(create_department_endpoint))
        .route(
            endpoints::DEPARTMENT,
            put(update_department_endpoint).delete(delete_department_endpoint),
        )
        .route(
            endpoints::DEPARTMENT_PHOTO,
            put(upload_photo_endpoint).layer(DefaultBodyLimit::max(photo_body_limit)),
        )
        .route(
            endpoints::DEPARTMENT_TRANSACTIONS,
            post(create_department_transaction_endpoint),
        )
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn(publisher_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let upload_dir = ServeDir::new(&state.upload_config.upload_path);

    public_routes
        .merge(authenticated_routes)
        .merge(publisher_routes)
        .nest_service(endpoints::UPLOADS, upload_dir)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Respond to any route that does not exist.
async fn get_404_not_found() -> Error {
    Error::NotFound
}
