use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::withdrawalmodel::{Network, Withdrawal, WithdrawalStatus, WithdrawalWithUser},
    utils::currency::usdt_to_f64,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateWithdrawalDto {
    #[validate(range(min = 10.0, max = 1000000.0, message = "Amount must be between 10 and 1,000,000 USDT"))]
    pub amount: f64,

    pub network: Network,

    #[validate(length(min = 1, max = 128, message = "Wallet address is required"))]
    pub wallet_address: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateWithdrawalDto {
    pub status: WithdrawalStatus,

    #[validate(length(min = 1, max = 128, message = "Transaction hash must be at most 128 characters"))]
    pub transaction_hash: Option<String>,

    #[validate(length(min = 1, max = 128, message = "Transaction UID must be at most 128 characters"))]
    pub transaction_uid: Option<String>,

    #[validate(length(max = 500, message = "Admin notes must be at most 500 characters"))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalDto {
    pub id: i64,
    pub user_id: i64,
    pub network: Network,
    pub wallet_address: String,
    pub transaction_hash: Option<String>,
    pub transaction_uid: Option<String>,
    pub amount: f64,
    pub status: WithdrawalStatus,
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(w: Withdrawal) -> Self {
        WithdrawalDto {
            id: w.id,
            user_id: w.user_id,
            network: w.network,
            wallet_address: w.wallet_address,
            transaction_hash: w.transaction_hash,
            transaction_uid: w.transaction_uid,
            amount: usdt_to_f64(&w.amount),
            status: w.status,
            admin_notes: w.admin_notes,
            user_name: None,
            user_email: None,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

impl From<WithdrawalWithUser> for WithdrawalDto {
    fn from(row: WithdrawalWithUser) -> Self {
        WithdrawalDto {
            user_name: Some(row.user_name),
            user_email: Some(row.user_email),
            ..WithdrawalDto::from(row.withdrawal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_minimum_is_ten() {
        let below: CreateWithdrawalDto = serde_json::from_str(
            r#"{"amount":9.5,"network":"TRC20","wallet_address":"TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t"}"#,
        )
        .unwrap();
        assert!(below.validate().is_err());

        let at: CreateWithdrawalDto = serde_json::from_str(
            r#"{"amount":10,"network":"BEP20","wallet_address":"0x55d398326f99059fF775485246999027B3197955"}"#,
        )
        .unwrap();
        assert!(at.validate().is_ok());
    }

    #[test]
    fn update_parses_status() {
        let body: UpdateWithdrawalDto = serde_json::from_str(
            r#"{"status":"completed","transaction_hash":"abc","transaction_uid":"uid-1"}"#,
        )
        .unwrap();
        assert_eq!(body.status, WithdrawalStatus::Completed);
        assert!(body.validate().is_ok());
    }
}
