use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::{referraldb::ReferralExt, userdb::UserExt},
    dtos::{
        referraldtos::{
            CommissionDto, ReferralCodeDto, ReferralMemberDto, ReferralOverviewDto,
            ReferralStatsDto, ReferralValidationDto, UpdateReferralStatusDto,
        },
        ApiResponse, ListQueryDto, ListResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::referralmodel::ReferralStatus,
    service::referral::{generate_referral_link, normalize_referral_code},
    AppState,
};

const RECENT_COMMISSIONS: i64 = 20;

pub fn referrals_handler() -> Router {
    Router::new().route("/", get(get_referral_overview))
}

pub fn admin_referrals_handler() -> Router {
    Router::new()
        .route("/", get(get_referral_codes))
        .route("/:id", put(update_referral_status))
}

pub async fn validate_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let invalid = ReferralValidationDto {
        valid: false,
        referrer_name: None,
    };

    let Some(code) = normalize_referral_code(&code) else {
        return Ok(Json(ApiResponse::ok(invalid)));
    };

    let referral = app_state
        .db_client
        .get_referral_by_code(&code)
        .await
        .map_err(HttpError::database)?
        .filter(|r| r.status == ReferralStatus::Active);

    let Some(referral) = referral else {
        return Ok(Json(ApiResponse::ok(invalid)));
    };

    let referrer = app_state
        .db_client
        .get_user(Some(referral.user_id), None)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(ApiResponse::ok(ReferralValidationDto {
        valid: referrer.is_some(),
        referrer_name: referrer.map(|u| u.name),
    })))
}

pub async fn get_referral_overview(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = user.user.user_id;

    let referral = app_state
        .db_client
        .get_referral_by_user(user_id)
        .await
        .map_err(HttpError::database)?;

    let stats = app_state
        .db_client
        .get_referral_stats(user_id)
        .await
        .map_err(HttpError::database)?;

    let level1 = app_state
        .db_client
        .get_downline(user_id, 1)
        .await
        .map_err(HttpError::database)?;

    let level2 = app_state
        .db_client
        .get_downline(user_id, 2)
        .await
        .map_err(HttpError::database)?;

    let commissions = app_state
        .db_client
        .get_commissions(user_id, RECENT_COMMISSIONS)
        .await
        .map_err(HttpError::database)?;

    let referral_code = referral
        .as_ref()
        .map(|r| r.referral_code.clone())
        .or_else(|| user.user.referral_code.clone());

    let overview = ReferralOverviewDto {
        referral_link: referral_code
            .as_deref()
            .map(|code| generate_referral_link(&app_state.env.app_url, code)),
        referral_code,
        status: referral.map(|r| r.status),
        stats: ReferralStatsDto::from(stats),
        level1: level1.into_iter().map(ReferralMemberDto::from).collect(),
        level2: level2.into_iter().map(ReferralMemberDto::from).collect(),
        recent_commissions: commissions.into_iter().map(CommissionDto::from).collect(),
    };

    Ok(Json(ApiResponse::ok(overview)))
}

pub async fn get_referral_codes(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status::<ReferralStatus>()?;

    let codes = app_state
        .db_client
        .get_referral_codes(status, i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_referral_code_count(status)
        .await
        .map_err(HttpError::database)?;

    let data = codes.into_iter().map(ReferralCodeDto::from).collect();

    Ok(Json(ListResponse::new(data, query.pagination(total))))
}

pub async fn update_referral_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(referral_id): Path<i64>,
    Json(body): Json<UpdateReferralStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let referral = app_state
        .db_client
        .update_referral_status(referral_id, body.status)
        .await?;

    Ok(Json(ApiResponse::with_message(
        format!("Referral code is now {}", referral.status.to_str()),
        referral,
    )))
}
