use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::depositmodel::{Deposit, DepositStatus, DepositWithUser, PaymentMethod},
    utils::currency::usdt_to_f64,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateDepositDto {
    #[validate(range(min = 50.0, max = 1000000.0, message = "Amount must be between 50 and 1,000,000 USDT"))]
    pub amount: f64,

    pub payment_method: PaymentMethod,

    #[validate(length(min = 1, max = 128, message = "Wallet address is required"))]
    pub wallet_address: String,

    #[validate(length(min = 1, max = 128, message = "Transaction hash is required"))]
    pub transaction_hash: String,

    #[validate(url(message = "Payment proof must be a URL"))]
    pub payment_proof_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewDepositDto {
    pub status: DepositStatus,

    #[validate(length(max = 500, message = "Admin notes must be at most 500 characters"))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositDto {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub wallet_address: String,
    pub transaction_hash: String,
    pub status: DepositStatus,
    pub payment_proof_url: Option<String>,
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Deposit> for DepositDto {
    fn from(d: Deposit) -> Self {
        DepositDto {
            id: d.id,
            user_id: d.user_id,
            amount: usdt_to_f64(&d.amount),
            payment_method: d.payment_method,
            wallet_address: d.wallet_address,
            transaction_hash: d.transaction_hash,
            status: d.status,
            payment_proof_url: d.payment_proof_url,
            admin_notes: d.admin_notes,
            user_name: None,
            user_email: None,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<DepositWithUser> for DepositDto {
    fn from(row: DepositWithUser) -> Self {
        DepositDto {
            user_name: Some(row.user_name),
            user_email: Some(row.user_email),
            ..DepositDto::from(row.deposit)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositAddressDto {
    pub payment_method: PaymentMethod,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositInfoDto {
    pub min_amount: f64,
    pub addresses: Vec<DepositAddressDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_below_minimum_fails_validation() {
        let body: CreateDepositDto = serde_json::from_str(
            r#"{"amount":49.99,"payment_method":"USDT_TRC20","wallet_address":"TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t","transaction_hash":"abc"}"#,
        )
        .unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn deposit_at_minimum_passes_validation() {
        let body: CreateDepositDto = serde_json::from_str(
            r#"{"amount":50,"payment_method":"USDT_BEP20","wallet_address":"0x55d398326f99059fF775485246999027B3197955","transaction_hash":"abc","payment_proof_url":"https://blob.example.com/p.png"}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn unknown_payment_method_is_rejected() {
        let parsed = serde_json::from_str::<CreateDepositDto>(
            r#"{"amount":60,"payment_method":"BTC","wallet_address":"x","transaction_hash":"y"}"#,
        );
        assert!(parsed.is_err());
    }
}
