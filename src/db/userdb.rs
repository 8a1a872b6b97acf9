// db/userdb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::db::{is_unique_violation_on, like_pattern, DBClient};
use crate::{
    models::usermodel::User,
    service::{error::ServiceError, referral::generate_referral_code},
};

pub(crate) const USER_COLUMNS: &str = r#"
    user_id, name, email, password_hash, role, account_balance, total_earning,
    rewards, referral_code, referred_by, created_at, updated_at
"#;

const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDashboard {
    pub account_balance: BigDecimal,
    pub total_earning: BigDecimal,
    pub rewards: BigDecimal,
    pub total_deposited: BigDecimal,
    pub total_withdrawn: BigDecimal,
    pub pending_deposits: i64,
    pub pending_withdrawals: i64,
    pub level1_count: i64,
    pub level2_count: i64,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    /// Creates the user and their referral code row in one transaction.
    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        referred_by: Option<i64>,
    ) -> Result<User, ServiceError>;

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: String,
    ) -> Result<User, sqlx::Error>;

    async fn promote_admins(&self, emails: &[String]) -> Result<u64, sqlx::Error>;

    async fn get_user_dashboard(&self, user_id: i64) -> Result<UserDashboard, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE user_id = ?",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE email = ?",
                USER_COLUMNS
            ))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let pattern = like_pattern(search);

        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE (? IS NULL OR name LIKE ? OR email LIKE ? OR referral_code LIKE ?)
            ORDER BY created_at DESC, user_id DESC
            LIMIT ? OFFSET ?
            "#,
            USER_COLUMNS
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = like_pattern(search);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE (? IS NULL OR name LIKE ? OR email LIKE ? OR referral_code LIKE ?)
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        referred_by: Option<i64>,
    ) -> Result<User, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let email = email.trim().to_lowercase();

        let mut attempts = 0;
        let (user_id, referral_code) = loop {
            let code = generate_referral_code();
            let result = sqlx::query(
                r#"
                INSERT INTO users (name, email, password_hash, referral_code, referred_by)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(name.trim())
            .bind(&email)
            .bind(password_hash)
            .bind(&code)
            .bind(referred_by)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(done) => break (done.last_insert_id() as i64, code),
                Err(e) if is_unique_violation_on(&e, "uq_users_email") => {
                    return Err(ServiceError::EmailExists);
                }
                Err(e) if is_unique_violation_on(&e, "uq_users_referral_code")
                    && attempts < MAX_CODE_ATTEMPTS =>
                {
                    attempts += 1;
                    tracing::debug!("referral code collision, retrying ({})", attempts);
                }
                Err(e) => return Err(ServiceError::Database(e)),
            }
        };

        sqlx::query("INSERT INTO referrals (user_id, referral_code, status) VALUES (?, ?, 'active')")
            .bind(user_id)
            .bind(&referral_code)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE user_id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE user_id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn promote_admins(&self, emails: &[String]) -> Result<u64, sqlx::Error> {
        let mut promoted = 0;
        for email in emails {
            promoted += sqlx::query("UPDATE users SET role = 'admin' WHERE email = ? AND role <> 'admin'")
                .bind(email)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(promoted)
    }

    async fn get_user_dashboard(&self, user_id: i64) -> Result<UserDashboard, sqlx::Error> {
        sqlx::query_as::<_, UserDashboard>(
            r#"
            SELECT
                u.account_balance,
                u.total_earning,
                u.rewards,
                COALESCE((SELECT SUM(d.amount) FROM deposits d
                          WHERE d.user_id = u.user_id AND d.status = 'verified'), 0) AS total_deposited,
                COALESCE((SELECT SUM(w.amount) FROM withdrawals w
                          WHERE w.user_id = u.user_id AND w.status IN ('approved', 'completed')), 0) AS total_withdrawn,
                (SELECT COUNT(*) FROM deposits d
                 WHERE d.user_id = u.user_id AND d.status = 'pending') AS pending_deposits,
                (SELECT COUNT(*) FROM withdrawals w
                 WHERE w.user_id = u.user_id AND w.status = 'pending') AS pending_withdrawals,
                (SELECT COUNT(*) FROM users c WHERE c.referred_by = u.user_id) AS level1_count,
                (SELECT COUNT(*) FROM users c
                 JOIN users gc ON gc.referred_by = c.user_id
                 WHERE c.referred_by = u.user_id) AS level2_count
            FROM users u
            WHERE u.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
