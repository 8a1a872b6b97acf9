use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Trc20,
    Bep20,
}

impl Network {
    pub fn to_str(&self) -> &str {
        match self {
            Network::Trc20 => "TRC20",
            Network::Bep20 => "BEP20",
        }
    }
}

impl TryFrom<String> for Network {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "TRC20" => Ok(Network::Trc20),
            "BEP20" => Ok(Network::Bep20),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl WithdrawalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Completed) | (Approved, Rejected)
        )
    }

    /// The balance is held from approval until completion or rejection.
    pub fn holds_funds(&self) -> bool {
        matches!(self, WithdrawalStatus::Approved | WithdrawalStatus::Completed)
    }
}

impl TryFrom<String> for WithdrawalStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "completed" => Ok(WithdrawalStatus::Completed),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub network: Network,
    pub wallet_address: String,
    pub transaction_hash: Option<String>,
    pub transaction_uid: Option<String>,
    pub amount: BigDecimal,
    #[sqlx(try_from = "String")]
    pub status: WithdrawalStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct WithdrawalWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub withdrawal: Withdrawal,
    pub user_name: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use WithdrawalStatus::*;

    #[test]
    fn withdrawal_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Completed));
        assert!(Approved.can_transition_to(Rejected));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn funds_are_held_once_approved() {
        assert!(!Pending.holds_funds());
        assert!(Approved.holds_funds());
        assert!(Completed.holds_funds());
        assert!(!Rejected.holds_funds());
    }

    #[test]
    fn network_wire_names() {
        assert_eq!(serde_json::to_string(&Network::Trc20).unwrap(), "\"TRC20\"");
        assert_eq!(Network::try_from("BEP20".to_string()).unwrap(), Network::Bep20);
        assert!(Network::try_from("ERC20".to_string()).is_err());
    }
}
