use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum PaymentMethod {
    #[serde(rename = "USDT_TRC20")]
    UsdtTrc20,
    #[serde(rename = "USDT_BEP20")]
    UsdtBep20,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::UsdtTrc20 => "USDT_TRC20",
            PaymentMethod::UsdtBep20 => "USDT_BEP20",
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "USDT_TRC20" => Ok(PaymentMethod::UsdtTrc20),
            "USDT_BEP20" => Ok(PaymentMethod::UsdtBep20),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Verified,
    Rejected,
}

impl DepositStatus {
    pub fn to_str(&self) -> &str {
        match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Verified => "verified",
            DepositStatus::Rejected => "rejected",
        }
    }

    /// Deposits are reviewed exactly once.
    pub fn can_transition_to(&self, next: DepositStatus) -> bool {
        matches!(
            (self, next),
            (DepositStatus::Pending, DepositStatus::Verified)
                | (DepositStatus::Pending, DepositStatus::Rejected)
        )
    }
}

impl TryFrom<String> for DepositStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(DepositStatus::Pending),
            "verified" => Ok(DepositStatus::Verified),
            "rejected" => Ok(DepositStatus::Rejected),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Deposit {
    pub id: i64,
    pub user_id: i64,
    pub amount: BigDecimal,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub wallet_address: String,
    pub transaction_hash: String,
    #[sqlx(try_from = "String")]
    pub status: DepositStatus,
    pub payment_proof_url: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deposit row joined with its owner, for the admin review table
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct DepositWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub deposit: Deposit,
    pub user_name: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_deposits_can_be_reviewed() {
        assert!(DepositStatus::Pending.can_transition_to(DepositStatus::Verified));
        assert!(DepositStatus::Pending.can_transition_to(DepositStatus::Rejected));
        assert!(!DepositStatus::Verified.can_transition_to(DepositStatus::Rejected));
        assert!(!DepositStatus::Rejected.can_transition_to(DepositStatus::Verified));
        assert!(!DepositStatus::Pending.can_transition_to(DepositStatus::Pending));
    }

    #[test]
    fn payment_method_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::UsdtTrc20).unwrap(),
            "\"USDT_TRC20\""
        );
        assert_eq!(
            PaymentMethod::try_from("USDT_BEP20".to_string()).unwrap(),
            PaymentMethod::UsdtBep20
        );
    }
}
