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
    db::depositdb::DepositExt,
    dtos::{
        depositdtos::{
            CreateDepositDto, DepositAddressDto, DepositDto, DepositInfoDto, ReviewDepositDto,
        },
        ApiResponse, ListQueryDto, ListResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::depositmodel::{DepositStatus, PaymentMethod},
    utils::{
        currency::{ensure_minimum, min_deposit, usdt_from_f64, usdt_to_f64},
        wallet_address::{is_bep20_address, is_trc20_address, is_transaction_hash},
    },
    AppState,
};

pub fn deposits_handler() -> Router {
    Router::new().route("/", get(get_my_deposits).post(create_deposit))
}

pub fn admin_deposits_handler() -> Router {
    Router::new()
        .route("/", get(get_all_deposits))
        .route("/:id", put(review_deposit))
}

/// Checks the sender address belongs to the network of the payment method.
fn validate_sender(method: PaymentMethod, wallet_address: &str) -> Result<(), HttpError> {
    let valid = match method {
        PaymentMethod::UsdtTrc20 => is_trc20_address(wallet_address),
        PaymentMethod::UsdtBep20 => is_bep20_address(wallet_address),
    };

    if !valid {
        return Err(HttpError::bad_request(format!(
            "Wallet address is not a valid {} address",
            method.to_str()
        )));
    }
    Ok(())
}

pub async fn deposit_info(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let addresses = vec![
        DepositAddressDto {
            payment_method: PaymentMethod::UsdtTrc20,
            address: app_state.env.trc20_deposit_address.clone(),
        },
        DepositAddressDto {
            payment_method: PaymentMethod::UsdtBep20,
            address: app_state.env.bep20_deposit_address.clone(),
        },
    ];

    Ok(Json(ApiResponse::ok(DepositInfoDto {
        min_amount: usdt_to_f64(&min_deposit()),
        addresses,
    })))
}

pub async fn create_deposit(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateDepositDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = usdt_from_f64(body.amount).map_err(HttpError::bad_request)?;
    ensure_minimum(&amount, &min_deposit(), "deposit").map_err(HttpError::bad_request)?;

    let wallet_address = body.wallet_address.trim().to_string();
    validate_sender(body.payment_method, &wallet_address)?;

    let transaction_hash = body.transaction_hash.trim().to_string();
    if !is_transaction_hash(&transaction_hash) {
        return Err(HttpError::bad_request("Transaction hash is not valid"));
    }

    let deposit = app_state
        .db_client
        .create_deposit(
            user.user.user_id,
            amount,
            body.payment_method,
            wallet_address,
            transaction_hash,
            body.payment_proof_url,
        )
        .await?;

    tracing::info!(
        "deposit {} of {} submitted by user {}",
        deposit.id,
        deposit.amount,
        deposit.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Deposit submitted and awaiting verification",
            DepositDto::from(deposit),
        )),
    ))
}

pub async fn get_my_deposits(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status::<DepositStatus>()?;
    let user_id = user.user.user_id;

    let deposits = app_state
        .db_client
        .get_user_deposits(user_id, status, i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_user_deposit_count(user_id, status)
        .await
        .map_err(HttpError::database)?;

    let data = deposits.into_iter().map(DepositDto::from).collect();

    Ok(Json(ListResponse::new(data, query.pagination(total))))
}

pub async fn get_all_deposits(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status::<DepositStatus>()?;

    let deposits = app_state
        .db_client
        .get_deposits(status, query.search(), i64::from(query.limit()), query.offset())
        .await
        .map_err(HttpError::database)?;

    let total = app_state
        .db_client
        .get_deposit_count(status, query.search())
        .await
        .map_err(HttpError::database)?;

    let data = deposits.into_iter().map(DepositDto::from).collect();

    Ok(Json(ListResponse::new(data, query.pagination(total))))
}

pub async fn review_deposit(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(deposit_id): Path<i64>,
    Json(body): Json<ReviewDepositDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.status == DepositStatus::Pending {
        return Err(HttpError::bad_request("Status must be verified or rejected"));
    }

    let deposit = app_state
        .db_client
        .review_deposit(deposit_id, body.status, body.admin_notes)
        .await?;

    tracing::info!(
        "deposit {} marked {} by admin {}",
        deposit.id,
        deposit.status.to_str(),
        admin.user.user_id
    );

    Ok(Json(ApiResponse::with_message(
        format!("Deposit {}", deposit.status.to_str()),
        DepositDto::from(deposit),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_address_must_match_method() {
        let tron = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
        let bsc = "0x55d398326f99059fF775485246999027B3197955";

        assert!(validate_sender(PaymentMethod::UsdtTrc20, tron).is_ok());
        assert!(validate_sender(PaymentMethod::UsdtBep20, bsc).is_ok());
        assert!(validate_sender(PaymentMethod::UsdtTrc20, bsc).is_err());
        assert!(validate_sender(PaymentMethod::UsdtBep20, tron).is_err());
    }
}
