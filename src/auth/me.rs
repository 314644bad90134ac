use axum::{Extension, Json};

use crate::{auth::User, envelope::Envelope};

/// Return the user the auth cookie belongs to.
pub async fn get_me(Extension(user): Extension<User>) -> Json<Envelope<User>> {
    Json(Envelope::new(user))
}

#[cfg(test)]
mod me_tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::{auth::Role, endpoints, test_utils::TestApp};

    #[tokio::test]
    async fn me_returns_logged_in_user() {
        let app = TestApp::new();
        let user = app.insert_user("jane@example.com", Role::Publisher);
        let cookie = app.log_in("jane@example.com").await;

        let response = app.server.get(endpoints::ME).add_cookie(cookie).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["id"], user.id.as_i64());
        assert_eq!(body["data"]["role"], "publisher");
    }

    #[tokio::test]
    async fn me_requires_log_in() {
        let app = TestApp::new();

        app.server
            .get(endpoints::ME)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
