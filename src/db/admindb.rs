// db/admindb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::db::DBClient;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_balances: BigDecimal,
    pub total_commissions: BigDecimal,
    pub verified_deposit_sum: BigDecimal,
    pub pending_deposits: i64,
    pub pending_deposit_sum: BigDecimal,
    pub pending_withdrawals: i64,
    pub pending_withdrawal_sum: BigDecimal,
    pub approved_withdrawals: i64,
    pub pending_payments: i64,
    pub pending_payment_sum: BigDecimal,
    pub active_referral_codes: i64,
}

#[async_trait]
pub trait AdminExt {
    async fn get_platform_stats(&self) -> Result<PlatformStats, sqlx::Error>;
}

#[async_trait]
impl AdminExt for DBClient {
    async fn get_platform_stats(&self) -> Result<PlatformStats, sqlx::Error> {
        sqlx::query_as::<_, PlatformStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COALESCE(SUM(account_balance), 0) FROM users) AS total_balances,
                (SELECT COALESCE(SUM(amount), 0) FROM commissions) AS total_commissions,
                (SELECT COALESCE(SUM(amount), 0) FROM deposits WHERE status = 'verified') AS verified_deposit_sum,
                (SELECT COUNT(*) FROM deposits WHERE status = 'pending') AS pending_deposits,
                (SELECT COALESCE(SUM(amount), 0) FROM deposits WHERE status = 'pending') AS pending_deposit_sum,
                (SELECT COUNT(*) FROM withdrawals WHERE status = 'pending') AS pending_withdrawals,
                (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE status = 'pending') AS pending_withdrawal_sum,
                (SELECT COUNT(*) FROM withdrawals WHERE status = 'approved') AS approved_withdrawals,
                (SELECT COUNT(*) FROM images WHERE status = 'pending') AS pending_payments,
                (SELECT COALESCE(SUM(amount), 0) FROM images WHERE status = 'pending') AS pending_payment_sum,
                (SELECT COUNT(*) FROM referrals WHERE status = 'active') AS active_referral_codes
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }
}
