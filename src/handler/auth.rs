use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::{referraldb::ReferralExt, userdb::UserExt},
    dtos::{
        userdtos::{FilterUserDto, LoginUserDto, SignupUserDto, UserLoginResponseDto},
        ApiResponse, Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::login_rate_limit,
    models::referralmodel::ReferralStatus,
    service::referral::normalize_referral_code,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route(
            "/login",
            post(login).layer(middleware::from_fn(login_rate_limit)),
        )
        .route("/logout", post(logout))
}

fn with_cookie(response: impl IntoResponse, cookie: Cookie<'static>) -> Result<axum::response::Response, HttpError> {
    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}

pub async fn signup(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SignupUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email))
        .await
        .map_err(HttpError::database)?;

    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        ));
    }

    // An empty code means "no referrer"; anything else must name an active code
    let mut referred_by: Option<i64> = None;
    if let Some(raw) = body.referral_code.as_deref().filter(|c| !c.trim().is_empty()) {
        let code = normalize_referral_code(raw)
            .ok_or_else(|| HttpError::bad_request(ErrorMessage::InvalidReferralCode.to_string()))?;

        let referral = app_state
            .db_client
            .get_referral_by_code(&code)
            .await
            .map_err(HttpError::database)?
            .filter(|r| r.status == ReferralStatus::Active)
            .ok_or_else(|| HttpError::bad_request(ErrorMessage::InvalidReferralCode.to_string()))?;

        referred_by = Some(referral.user_id);
    }

    let hashed_password = password::hash(&body.password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(body.name.trim(), &email, &hashed_password, referred_by)
        .await?;

    tracing::info!(
        "new user {} registered (referred_by: {:?})",
        user.user_id,
        user.referred_by
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Account created successfully",
            FilterUserDto::filter_user(&user),
        )),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    let user = app_state
        .db_client
        .get_user(None, Some(&email))
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password_hash)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    let token = token::create_token(
        &user.user_id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let response = Json(UserLoginResponseDto {
        success: true,
        token,
        user: FilterUserDto::filter_user(&user),
    });

    with_cookie(response, cookie)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = Cookie::build(("token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let response = Json(Response {
        success: true,
        message: "Logged out successfully".to_string(),
    });

    with_cookie(response, cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logout_expires_the_cookie() {
        let response = logout().await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }
}
