use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{
        userdtos::{DashboardDto, FilterUserDto, UserPasswordUpdateDto},
        ApiResponse, Response,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    utils::password,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/dashboard", get(get_dashboard))
        .route("/password", put(update_user_password))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(ApiResponse::ok(FilterUserDto::filter_user(&user.user))))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state
        .db_client
        .get_user_dashboard(user.user.user_id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(ApiResponse::ok(DashboardDto::from(dashboard))))
}

pub async fn update_user_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UserPasswordUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = &user.user;

    let password_match = password::compare(&body.old_password, &user.password_hash)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !password_match {
        return Err(HttpError::bad_request("Old password is incorrect".to_string()));
    }

    let hash_password = password::hash(&body.new_password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .db_client
        .update_user_password(user.user_id, hash_password)
        .await
        .map_err(HttpError::database)?;

    tracing::info!("user {} changed their password", user.user_id);

    let response = Response {
        message: "Password updated Successfully".to_string(),
        success: true,
    };

    Ok(Json(response))
}
