use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Approved)
                | (PaymentStatus::Pending, PaymentStatus::Rejected)
        )
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            _ => Err(UnknownVariant(value)),
        }
    }
}

/// A screenshot-backed payment proof, stored in the `images` table.
/// The hashed `hash_password` column is written on insert and never read back.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: i64,
    pub referred_id: i64,
    pub referrer_id: Option<i64>,
    pub image_url: String,
    pub transaction_hash: String,
    pub amount: BigDecimal,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_review_is_one_shot() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Approved));
        assert!(!PaymentStatus::Approved.can_transition_to(PaymentStatus::Rejected));
        assert!(!PaymentStatus::Rejected.can_transition_to(PaymentStatus::Approved));
    }
}
