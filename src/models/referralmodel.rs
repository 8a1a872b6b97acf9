use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Active,
    Inactive,
}

impl ReferralStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ReferralStatus::Active => "active",
            ReferralStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<String> for ReferralStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(ReferralStatus::Active),
            "inactive" => Ok(ReferralStatus::Inactive),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Referral {
    pub id: i64,
    pub user_id: i64,
    pub referral_code: String,
    #[sqlx(try_from = "String")]
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

/// Referral code joined with its owner for the admin screen
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ReferralCodeDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub referral: Referral,
    pub owner_name: String,
    pub owner_email: String,
    pub direct_referrals: i64,
}

/// A member of someone's downline
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ReferralMember {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub total_deposits: BigDecimal,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CommissionSource {
    Deposit,
    Payment,
}

impl CommissionSource {
    pub fn to_str(&self) -> &str {
        match self {
            CommissionSource::Deposit => "deposit",
            CommissionSource::Payment => "payment",
        }
    }
}

impl TryFrom<String> for CommissionSource {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "deposit" => Ok(CommissionSource::Deposit),
            "payment" => Ok(CommissionSource::Payment),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Commission {
    pub id: i64,
    pub beneficiary_id: i64,
    pub source_user_id: i64,
    pub level: i32,
    #[sqlx(try_from = "String")]
    pub source_kind: CommissionSource,
    pub source_id: i64,
    pub base_amount: BigDecimal,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReferralStats {
    pub level1_count: i64,
    pub level2_count: i64,
    pub level1_earnings: BigDecimal,
    pub level2_earnings: BigDecimal,
}
