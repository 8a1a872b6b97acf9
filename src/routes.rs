use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        auth::auth_handler,
        deposits::{deposit_info, deposits_handler},
        payments::payments_handler,
        referrals::{referrals_handler, validate_referral_code},
        users::users_handler,
        withdrawals::withdrawals_handler,
    },
    middleware::{admin_only, auth},
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let deposit_routes = Router::new()
        .merge(deposits_handler().layer(middleware::from_fn(auth)))
        .route("/info", get(deposit_info));

    let referral_routes = Router::new()
        .merge(referrals_handler().layer(middleware::from_fn(auth)))
        .route("/validate/:code", get(validate_referral_code));

    // `auth` is the outer layer so `admin_only` sees the loaded user
    let admin_routes = admin_handler()
        .layer(middleware::from_fn(admin_only))
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/deposits", deposit_routes)
        .nest("/withdrawals", withdrawals_handler().layer(middleware::from_fn(auth)))
        .nest("/payments", payments_handler().layer(middleware::from_fn(auth)))
        .nest("/referrals", referral_routes)
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use sqlx::mysql::MySqlPoolOptions;
    use tower::ServiceExt;

    // The pool never connects; every request below fails before touching it.
    fn test_app() -> Router {
        let config = Config::for_tests();
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(Arc::new(AppState::new(config, pool)))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in [
            "/api/users/me",
            "/api/deposits",
            "/api/withdrawals",
            "/api/payments",
            "/api/referrals",
            "/api/admin/stats",
            "/api/admin/deposits",
        ] {
            let request = Request::get(uri).body(Body::empty()).unwrap();
            assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let request = Request::get("/api/users/me")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deposit_info_is_public() {
        let request = Request::get("/api/deposits/info").body(Body::empty()).unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["min_amount"], 50.0);
        assert_eq!(body["data"]["addresses"][0]["address"], "TXYZ");
    }

    #[tokio::test]
    async fn malformed_referral_code_is_invalid_without_lookup() {
        let request = Request::get("/api/referrals/validate/bad!")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["valid"], false);
    }

    #[tokio::test]
    async fn invalid_signup_is_rejected_before_the_database() {
        let request = Request::post("/api/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"name":"Ada","email":"not-an-email","password":"abc","passwordConfirm":"abd"}"#,
            ))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_login_is_rejected_before_the_database() {
        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"","password":""}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_is_rate_limited_per_client() {
        let app = test_app();
        let mut last = StatusCode::OK;
        for _ in 0..6 {
            let request = Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::from(r#"{"email":"","password":""}"#))
                .unwrap();
            last = app.clone().oneshot(request).await.unwrap().status();
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }
}
