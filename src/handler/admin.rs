use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    db::{
        admindb::{AdminExt, PlatformStats},
        userdb::UserExt,
    },
    dtos::{userdtos::FilterUserDto, ApiResponse, ListQueryDto, ListResponse},
    error::HttpError,
    handler::{
        deposits::admin_deposits_handler, payments::admin_payments_handler,
        referrals::admin_referrals_handler, withdrawals::admin_withdrawals_handler,
    },
    utils::currency::usdt_to_f64,
    AppState,
};

/// Every admin screen; the caller wraps it in `auth` and `admin_only`.
pub fn admin_handler() -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/users", get(get_users))
        .nest("/deposits", admin_deposits_handler())
        .nest("/withdrawals", admin_withdrawals_handler())
        .nest("/payments", admin_payments_handler())
        .nest("/referrals", admin_referrals_handler())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlatformStatsDto {
    pub total_users: i64,
    pub total_balances: f64,
    pub total_commissions: f64,
    pub verified_deposit_sum: f64,
    pub pending_deposits: i64,
    pub pending_deposit_sum: f64,
    pub pending_withdrawals: i64,
    pub pending_withdrawal_sum: f64,
    pub approved_withdrawals: i64,
    pub pending_payments: i64,
    pub pending_payment_sum: f64,
    pub active_referral_codes: i64,
}

impl From<PlatformStats> for PlatformStatsDto {
    fn from(s: PlatformStats) -> Self {
        PlatformStatsDto {
            total_users: s.total_users,
            total_balances: usdt_to_f64(&s.total_balances),
            total_commissions: usdt_to_f64(&s.total_commissions),
            verified_deposit_sum: usdt_to_f64(&s.verified_deposit_sum),
            pending_deposits: s.pending_deposits,
            pending_deposit_sum: usdt_to_f64(&s.pending_deposit_sum),
            pending_withdrawals: s.pending_withdrawals,
            pending_withdrawal_sum: usdt_to_f64(&s.pending_withdrawal_sum),
            approved_withdrawals: s.approved_withdrawals,
            pending_payments: s.pending_payments,
            pending_payment_sum: usdt_to_f64(&s.pending_payment_sum),
            active_referral_codes: s.active_referral_codes,
        }
    }
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .get_platform_stats()
        .await
        .map_err(HttpError::database)?;

    Ok(Json(ApiResponse::ok(PlatformStatsDto::from(stats))))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let users = app_state
        .db_client
        .get_users(query.search(), i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_user_count(query.search())
        .await
        .map_err(HttpError::database)?;

    Ok(Json(ListResponse::new(
        FilterUserDto::filter_users(&users),
        query.pagination(total),
    )))
}
