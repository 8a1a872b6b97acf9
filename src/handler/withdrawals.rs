use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::withdrawaldb::{WithdrawalExt, WithdrawalReview},
    dtos::{
        withdrawaldtos::{CreateWithdrawalDto, UpdateWithdrawalDto, WithdrawalDto},
        ApiResponse, ListQueryDto, ListResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::withdrawalmodel::{Network, WithdrawalStatus},
    utils::{
        currency::{ensure_minimum, min_withdrawal, usdt_from_f64},
        wallet_address::{is_bep20_address, is_trc20_address},
    },
    AppState,
};

pub fn withdrawals_handler() -> Router {
    Router::new().route("/", get(get_my_withdrawals).post(create_withdrawal))
}

pub fn admin_withdrawals_handler() -> Router {
    Router::new()
        .route("/", get(get_all_withdrawals))
        .route("/:id", put(update_withdrawal))
}

fn validate_destination(network: Network, wallet_address: &str) -> Result<(), HttpError> {
    let valid = match network {
        Network::Trc20 => is_trc20_address(wallet_address),
        Network::Bep20 => is_bep20_address(wallet_address),
    };

    if !valid {
        return Err(HttpError::bad_request(format!(
            "Wallet address is not a valid {} address",
            network.to_str()
        )));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn create_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateWithdrawalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = usdt_from_f64(body.amount).map_err(HttpError::bad_request)?;
    ensure_minimum(&amount, &min_withdrawal(), "withdrawal").map_err(HttpError::bad_request)?;

    let wallet_address = body.wallet_address.trim().to_string();
    validate_destination(body.network, &wallet_address)?;

    let withdrawal = app_state
        .db_client
        .create_withdrawal(user.user.user_id, body.network, wallet_address, amount)
        .await?;

    tracing::info!(
        "withdrawal {} of {} requested by user {}",
        withdrawal.id,
        withdrawal.amount,
        withdrawal.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Withdrawal request submitted",
            WithdrawalDto::from(withdrawal),
        )),
    ))
}

pub async fn get_my_withdrawals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status::<WithdrawalStatus>()?;
    let user_id = user.user.user_id;

    let withdrawals = app_state
        .db_client
        .get_user_withdrawals(user_id, status, i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_user_withdrawal_count(user_id, status)
        .await
        .map_err(HttpError::database)?;

    let data = withdrawals.into_iter().map(WithdrawalDto::from).collect();

    Ok(Json(ListResponse::new(data, query.pagination(total))))
}

pub async fn get_all_withdrawals(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status::<WithdrawalStatus>()?;

    let withdrawals = app_state
        .db_client
        .get_withdrawals(status, query.search(), i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_withdrawal_count(status, query.search())
        .await
        .map_err(HttpError::database)?;

    let data = withdrawals.into_iter().map(WithdrawalDto::from).collect();

    Ok(Json(ListResponse::new(data, query.pagination(total))))
}

pub async fn update_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(withdrawal_id): Path<i64>,
    Json(body): Json<UpdateWithdrawalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = WithdrawalReview {
        transaction_hash: trimmed(body.transaction_hash),
        transaction_uid: trimmed(body.transaction_uid),
        admin_notes: trimmed(body.admin_notes),
    };

    let withdrawal = app_state
        .db_client
        .update_withdrawal_status(withdrawal_id, body.status, review)
        .await?;

    tracing::info!(
        "withdrawal {} marked {} by admin {}",
        withdrawal.id,
        withdrawal.status.to_str(),
        admin.user.user_id
    );

    Ok(Json(ApiResponse::with_message(
        format!("Withdrawal {}", withdrawal.status.to_str()),
        WithdrawalDto::from(withdrawal),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_must_match_network() {
        assert!(validate_destination(Network::Trc20, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").is_ok());
        assert!(validate_destination(Network::Bep20, "0x55d398326f99059fF775485246999027B3197955").is_ok());
        assert!(validate_destination(Network::Bep20, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").is_err());
    }

    #[test]
    fn blank_review_fields_are_dropped() {
        assert_eq!(trimmed(Some("  ".to_string())), None);
        assert_eq!(trimmed(Some(" 0xabc ".to_string())).as_deref(), Some("0xabc"));
        assert_eq!(trimmed(None), None);
    }
}
