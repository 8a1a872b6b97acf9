// db/referraldb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::MySqlConnection;

use super::db::DBClient;
use crate::{
    models::referralmodel::{
        Commission, CommissionSource, Referral, ReferralCodeDetail, ReferralMember,
        ReferralStats, ReferralStatus,
    },
    service::{
        error::ServiceError,
        ledger::BalanceCredit,
        referral::{plan_commissions, CommissionCredit},
    },
};

async fn apply_credit(
    conn: &mut MySqlConnection,
    user_id: i64,
    credit: &BalanceCredit,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET account_balance = account_balance + ?,
            total_earning = total_earning + ?,
            rewards = rewards + ?
        WHERE user_id = ?
        "#,
    )
    .bind(&credit.account_balance)
    .bind(&credit.total_earning)
    .bind(&credit.rewards)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct Ancestors {
    level1: Option<i64>,
    level2: Option<i64>,
    level1_status: Option<String>,
    level2_status: Option<String>,
}

impl Ancestors {
    /// Ancestors whose referral code is inactive do not earn.
    fn earning(&self) -> (Option<i64>, Option<i64>) {
        let active = |status: &Option<String>| status.as_deref() == Some(ReferralStatus::Active.to_str());
        (
            self.level1.filter(|_| active(&self.level1_status)),
            self.level2.filter(|_| active(&self.level2_status)),
        )
    }
}

/// Credits `amount` to the user and pays referral commissions to their
/// level-1 and level-2 referrers. Must run inside the caller's transaction.
pub(crate) async fn credit_with_commissions(
    conn: &mut MySqlConnection,
    user_id: i64,
    amount: &BigDecimal,
    source_kind: CommissionSource,
    source_id: i64,
) -> Result<Vec<CommissionCredit>, sqlx::Error> {
    let ancestors = sqlx::query_as::<_, Ancestors>(
        r#"
        SELECT
            u.referred_by AS level1,
            p.referred_by AS level2,
            r1.status AS level1_status,
            r2.status AS level2_status
        FROM users u
        LEFT JOIN users p ON p.user_id = u.referred_by
        LEFT JOIN referrals r1 ON r1.user_id = u.referred_by
        LEFT JOIN referrals r2 ON r2.user_id = p.referred_by
        WHERE u.user_id = ?
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    apply_credit(&mut *conn, user_id, &BalanceCredit::funding(amount)).await?;

    let (level1, level2) = ancestors.earning();
    let credits = plan_commissions(user_id, level1, level2, amount);

    for credit in &credits {
        apply_credit(&mut *conn, credit.beneficiary_id, &BalanceCredit::commission(&credit.amount)).await?;

        sqlx::query(
            r#"
            INSERT INTO commissions
            (beneficiary_id, source_user_id, level, source_kind, source_id, base_amount, amount)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(credit.beneficiary_id)
        .bind(user_id)
        .bind(credit.level)
        .bind(source_kind.to_str())
        .bind(source_id)
        .bind(amount)
        .bind(&credit.amount)
        .execute(&mut *conn)
        .await?;

        tracing::info!(
            "level {} commission of {} credited to user {} from {} {}",
            credit.level,
            credit.amount,
            credit.beneficiary_id,
            source_kind.to_str(),
            source_id
        );
    }

    Ok(credits)
}

#[async_trait]
pub trait ReferralExt {
    async fn get_referral_by_code(&self, code: &str) -> Result<Option<Referral>, sqlx::Error>;

    async fn get_referral_by_user(&self, user_id: i64) -> Result<Option<Referral>, sqlx::Error>;

    async fn get_referral_codes(
        &self,
        status: Option<ReferralStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReferralCodeDetail>, sqlx::Error>;

    async fn get_referral_code_count(
        &self,
        status: Option<ReferralStatus>,
    ) -> Result<i64, sqlx::Error>;

    async fn update_referral_status(
        &self,
        id: i64,
        status: ReferralStatus,
    ) -> Result<Referral, ServiceError>;

    /// Members `level` hops below `user_id` (1 = direct referrals).
    async fn get_downline(
        &self,
        user_id: i64,
        level: u8,
    ) -> Result<Vec<ReferralMember>, sqlx::Error>;

    async fn get_referral_stats(&self, user_id: i64) -> Result<ReferralStats, sqlx::Error>;

    async fn get_commissions(
        &self,
        beneficiary_id: i64,
        limit: i64,
    ) -> Result<Vec<Commission>, sqlx::Error>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn get_referral_by_code(&self, code: &str) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            "SELECT id, user_id, referral_code, status, created_at FROM referrals WHERE referral_code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_referral_by_user(&self, user_id: i64) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            "SELECT id, user_id, referral_code, status, created_at FROM referrals WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_referral_codes(
        &self,
        status: Option<ReferralStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReferralCodeDetail>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_as::<_, ReferralCodeDetail>(
            r#"
            SELECT
                r.id, r.user_id, r.referral_code, r.status, r.created_at,
                u.name AS owner_name,
                u.email AS owner_email,
                (SELECT COUNT(*) FROM users c WHERE c.referred_by = r.user_id) AS direct_referrals
            FROM referrals r
            JOIN users u ON u.user_id = r.user_id
            WHERE (? IS NULL OR r.status = ?)
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&status)
        .bind(&status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_referral_code_count(
        &self,
        status: Option<ReferralStatus>,
    ) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM referrals WHERE (? IS NULL OR status = ?)")
            .bind(&status)
            .bind(&status)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_referral_status(
        &self,
        id: i64,
        status: ReferralStatus,
    ) -> Result<Referral, ServiceError> {
        let updated = sqlx::query("UPDATE referrals SET status = ? WHERE id = ?")
            .bind(status.to_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        let referral = sqlx::query_as::<_, Referral>(
            "SELECT id, user_id, referral_code, status, created_at FROM referrals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("Referral", id))?;

        if updated.rows_affected() > 0 {
            tracing::info!("referral code {} set to {}", referral.referral_code, status.to_str());
        }
        Ok(referral)
    }

    async fn get_downline(
        &self,
        user_id: i64,
        level: u8,
    ) -> Result<Vec<ReferralMember>, sqlx::Error> {
        let query = match level {
            1 => {
                r#"
                SELECT m.user_id, m.name, m.email, m.created_at AS joined_at,
                    COALESCE((SELECT SUM(d.amount) FROM deposits d
                              WHERE d.user_id = m.user_id AND d.status = 'verified'), 0) AS total_deposits
                FROM users m
                WHERE m.referred_by = ?
                ORDER BY m.created_at DESC
                "#
            }
            2 => {
                r#"
                SELECT m.user_id, m.name, m.email, m.created_at AS joined_at,
                    COALESCE((SELECT SUM(d.amount) FROM deposits d
                              WHERE d.user_id = m.user_id AND d.status = 'verified'), 0) AS total_deposits
                FROM users c
                JOIN users m ON m.referred_by = c.user_id
                WHERE c.referred_by = ?
                ORDER BY m.created_at DESC
                "#
            }
            _ => return Ok(Vec::new()),
        };

        sqlx::query_as::<_, ReferralMember>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_referral_stats(&self, user_id: i64) -> Result<ReferralStats, sqlx::Error> {
        let (level1_count, level2_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users c WHERE c.referred_by = ?),
                (SELECT COUNT(*) FROM users c JOIN users gc ON gc.referred_by = c.user_id
                 WHERE c.referred_by = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let (level1_earnings, level2_earnings): (BigDecimal, BigDecimal) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN level = 1 THEN amount END), 0),
                COALESCE(SUM(CASE WHEN level = 2 THEN amount END), 0)
            FROM commissions
            WHERE beneficiary_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReferralStats {
            level1_count,
            level2_count,
            level1_earnings,
            level2_earnings,
        })
    }

    async fn get_commissions(
        &self,
        beneficiary_id: i64,
        limit: i64,
    ) -> Result<Vec<Commission>, sqlx::Error> {
        sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, beneficiary_id, source_user_id, level, source_kind, source_id,
                   base_amount, amount, created_at
            FROM commissions
            WHERE beneficiary_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(beneficiary_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ancestors(l1: Option<(i64, &str)>, l2: Option<(i64, &str)>) -> Ancestors {
        Ancestors {
            level1: l1.map(|(id, _)| id),
            level2: l2.map(|(id, _)| id),
            level1_status: l1.map(|(_, s)| s.to_string()),
            level2_status: l2.map(|(_, s)| s.to_string()),
        }
    }

    #[test]
    fn inactive_referrers_do_not_earn() {
        let both = ancestors(Some((2, "active")), Some((1, "active")));
        assert_eq!(both.earning(), (Some(2), Some(1)));

        let suspended = ancestors(Some((2, "inactive")), Some((1, "active")));
        assert_eq!(suspended.earning(), (None, Some(1)));

        let none = ancestors(None, None);
        assert_eq!(none.earning(), (None, None));
    }
}
