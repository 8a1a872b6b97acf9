use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::referralmodel::{
        Commission, CommissionSource, ReferralCodeDetail, ReferralMember, ReferralStats,
        ReferralStatus,
    },
    utils::currency::usdt_to_f64,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralValidationDto {
    pub valid: bool,
    pub referrer_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateReferralStatusDto {
    pub status: ReferralStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralMemberDto {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub total_deposits: f64,
    pub joined_at: DateTime<Utc>,
}

impl From<ReferralMember> for ReferralMemberDto {
    fn from(m: ReferralMember) -> Self {
        ReferralMemberDto {
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            total_deposits: usdt_to_f64(&m.total_deposits),
            joined_at: m.joined_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionDto {
    pub id: i64,
    pub source_user_id: i64,
    pub level: i32,
    pub source_kind: CommissionSource,
    pub source_id: i64,
    pub base_amount: f64,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Commission> for CommissionDto {
    fn from(c: Commission) -> Self {
        CommissionDto {
            id: c.id,
            source_user_id: c.source_user_id,
            level: c.level,
            source_kind: c.source_kind,
            source_id: c.source_id,
            base_amount: usdt_to_f64(&c.base_amount),
            amount: usdt_to_f64(&c.amount),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralStatsDto {
    pub level1_count: i64,
    pub level2_count: i64,
    pub level1_earnings: f64,
    pub level2_earnings: f64,
    pub total_earnings: f64,
}

impl From<ReferralStats> for ReferralStatsDto {
    fn from(s: ReferralStats) -> Self {
        let total = s.level1_earnings.clone() + s.level2_earnings.clone();
        ReferralStatsDto {
            level1_count: s.level1_count,
            level2_count: s.level2_count,
            level1_earnings: usdt_to_f64(&s.level1_earnings),
            level2_earnings: usdt_to_f64(&s.level2_earnings),
            total_earnings: usdt_to_f64(&total),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralOverviewDto {
    pub referral_code: Option<String>,
    pub status: Option<ReferralStatus>,
    pub referral_link: Option<String>,
    pub stats: ReferralStatsDto,
    pub level1: Vec<ReferralMemberDto>,
    pub level2: Vec<ReferralMemberDto>,
    pub recent_commissions: Vec<CommissionDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralCodeDto {
    pub id: i64,
    pub user_id: i64,
    pub referral_code: String,
    pub status: ReferralStatus,
    pub owner_name: String,
    pub owner_email: String,
    pub direct_referrals: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ReferralCodeDetail> for ReferralCodeDto {
    fn from(row: ReferralCodeDetail) -> Self {
        ReferralCodeDto {
            id: row.referral.id,
            user_id: row.referral.user_id,
            referral_code: row.referral.referral_code,
            status: row.referral.status,
            owner_name: row.owner_name,
            owner_email: row.owner_email,
            direct_referrals: row.direct_referrals,
            created_at: row.referral.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn stats_total_adds_both_levels() {
        let stats = ReferralStatsDto::from(ReferralStats {
            level1_count: 3,
            level2_count: 5,
            level1_earnings: BigDecimal::from_str("4.50").unwrap(),
            level2_earnings: BigDecimal::from_str("1.25").unwrap(),
        });
        assert_eq!(stats.total_earnings, 5.75);
    }
}
