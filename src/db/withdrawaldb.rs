// db/withdrawaldb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::db::{like_pattern, DBClient};
use crate::{
    models::withdrawalmodel::{Network, Withdrawal, WithdrawalStatus, WithdrawalWithUser},
    service::{
        error::ServiceError,
        ledger::{available_for_withdrawal, ensure_funds, withdrawal_balance_change, BalanceChange},
    },
};

const WITHDRAWAL_COLUMNS: &str = r#"
    w.id, w.user_id, w.network, w.wallet_address, w.transaction_hash, w.transaction_uid,
    w.amount, w.status, w.admin_notes, w.created_at, w.updated_at
"#;

/// Fields an admin may set alongside a status change.
#[derive(Debug, Default, Clone)]
pub struct WithdrawalReview {
    pub transaction_hash: Option<String>,
    pub transaction_uid: Option<String>,
    pub admin_notes: Option<String>,
}

#[async_trait]
pub trait WithdrawalExt {
    /// Rejects the request when it exceeds the balance not already claimed by pending requests.
    async fn create_withdrawal(
        &self,
        user_id: i64,
        network: Network,
        wallet_address: String,
        amount: BigDecimal,
    ) -> Result<Withdrawal, ServiceError>;

    async fn get_user_withdrawals(
        &self,
        user_id: i64,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Withdrawal>, sqlx::Error>;

    async fn get_user_withdrawal_count(
        &self,
        user_id: i64,
        status: Option<WithdrawalStatus>,
    ) -> Result<i64, sqlx::Error>;

    async fn get_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WithdrawalWithUser>, sqlx::Error>;

    async fn get_withdrawal_count(
        &self,
        status: Option<WithdrawalStatus>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error>;

    async fn update_withdrawal_status(
        &self,
        id: i64,
        status: WithdrawalStatus,
        review: WithdrawalReview,
    ) -> Result<Withdrawal, ServiceError>;
}

#[async_trait]
impl WithdrawalExt for DBClient {
    async fn create_withdrawal(
        &self,
        user_id: i64,
        network: Network,
        wallet_address: String,
        amount: BigDecimal,
    ) -> Result<Withdrawal, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let balance: BigDecimal =
            sqlx::query_scalar("SELECT account_balance FROM users WHERE user_id = ? FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ServiceError::NotFound("User", user_id))?;

        let pending: BigDecimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = ? AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        ensure_funds(&amount, available_for_withdrawal(&balance, &pending))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO withdrawals (user_id, network, wallet_address, amount, status)
            VALUES (?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(user_id)
        .bind(network.to_str())
        .bind(wallet_address)
        .bind(&amount)
        .execute(&mut *tx)
        .await?;

        let withdrawal = sqlx::query_as::<_, Withdrawal>(&format!(
            "SELECT {} FROM withdrawals w WHERE w.id = ?",
            WITHDRAWAL_COLUMNS
        ))
        .bind(inserted.last_insert_id() as i64)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn get_user_withdrawals(
        &self,
        user_id: i64,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Withdrawal>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_as::<_, Withdrawal>(&format!(
            r#"
            SELECT {} FROM withdrawals w
            WHERE w.user_id = ? AND (? IS NULL OR w.status = ?)
            ORDER BY w.created_at DESC, w.id DESC
            LIMIT ? OFFSET ?
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(user_id)
        .bind(&status)
        .bind(&status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_withdrawal_count(
        &self,
        user_id: i64,
        status: Option<WithdrawalStatus>,
    ) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM withdrawals WHERE user_id = ? AND (? IS NULL OR status = ?)",
        )
        .bind(user_id)
        .bind(&status)
        .bind(&status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WithdrawalWithUser>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());
        let pattern = like_pattern(search);

        sqlx::query_as::<_, WithdrawalWithUser>(&format!(
            r#"
            SELECT {}, u.name AS user_name, u.email AS user_email
            FROM withdrawals w
            JOIN users u ON u.user_id = w.user_id
            WHERE (? IS NULL OR w.status = ?)
              AND (? IS NULL OR u.email LIKE ? OR u.name LIKE ? OR w.wallet_address LIKE ?)
            ORDER BY w.created_at DESC, w.id DESC
            LIMIT ? OFFSET ?
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(&status)
        .bind(&status)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_withdrawal_count(
        &self,
        status: Option<WithdrawalStatus>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());
        let pattern = like_pattern(search);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM withdrawals w
            JOIN users u ON u.user_id = w.user_id
            WHERE (? IS NULL OR w.status = ?)
              AND (? IS NULL OR u.email LIKE ? OR u.name LIKE ? OR w.wallet_address LIKE ?)
            "#,
        )
        .bind(&status)
        .bind(&status)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_withdrawal_status(
        &self,
        id: i64,
        status: WithdrawalStatus,
        review: WithdrawalReview,
    ) -> Result<Withdrawal, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let withdrawal = sqlx::query_as::<_, Withdrawal>(&format!(
            "SELECT {} FROM withdrawals w WHERE w.id = ? FOR UPDATE",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("Withdrawal", id))?;

        if !withdrawal.status.can_transition_to(status) {
            return Err(ServiceError::InvalidTransition {
                entity: "withdrawal",
                from: withdrawal.status.to_str().to_string(),
                to: status.to_str().to_string(),
            });
        }

        match withdrawal_balance_change(withdrawal.status, status) {
            BalanceChange::Debit => {
                let balance: BigDecimal = sqlx::query_scalar(
                    "SELECT account_balance FROM users WHERE user_id = ? FOR UPDATE",
                )
                .bind(withdrawal.user_id)
                .fetch_one(&mut *tx)
                .await?;

                ensure_funds(&withdrawal.amount, balance)?;

                sqlx::query("UPDATE users SET account_balance = account_balance - ? WHERE user_id = ?")
                    .bind(&withdrawal.amount)
                    .bind(withdrawal.user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            BalanceChange::Refund => {
                sqlx::query("UPDATE users SET account_balance = account_balance + ? WHERE user_id = ?")
                    .bind(&withdrawal.amount)
                    .bind(withdrawal.user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            BalanceChange::Unchanged => {}
        }

        sqlx::query(
            r#"
            UPDATE withdrawals
            SET status = ?,
                transaction_hash = COALESCE(?, transaction_hash),
                transaction_uid = COALESCE(?, transaction_uid),
                admin_notes = COALESCE(?, admin_notes)
            WHERE id = ?
            "#,
        )
        .bind(status.to_str())
        .bind(review.transaction_hash)
        .bind(review.transaction_uid)
        .bind(review.admin_notes)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Withdrawal>(&format!(
            "SELECT {} FROM withdrawals w WHERE w.id = ?",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "withdrawal {} of {} for user {} moved {} -> {}",
            updated.id,
            updated.amount,
            updated.user_id,
            withdrawal.status.to_str(),
            updated.status.to_str()
        );
        Ok(updated)
    }
}
