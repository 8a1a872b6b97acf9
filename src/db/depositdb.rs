// db/depositdb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::{
    db::{like_pattern, DBClient},
    referraldb::credit_with_commissions,
};
use crate::{
    models::{
        depositmodel::{Deposit, DepositStatus, DepositWithUser, PaymentMethod},
        referralmodel::CommissionSource,
    },
    service::error::ServiceError,
};

const DEPOSIT_COLUMNS: &str = r#"
    d.id, d.user_id, d.amount, d.payment_method, d.wallet_address, d.transaction_hash,
    d.status, d.payment_proof_url, d.admin_notes, d.created_at, d.updated_at
"#;

#[async_trait]
pub trait DepositExt {
    async fn create_deposit(
        &self,
        user_id: i64,
        amount: BigDecimal,
        payment_method: PaymentMethod,
        wallet_address: String,
        transaction_hash: String,
        payment_proof_url: Option<String>,
    ) -> Result<Deposit, ServiceError>;

    async fn get_user_deposits(
        &self,
        user_id: i64,
        status: Option<DepositStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Deposit>, sqlx::Error>;

    async fn get_user_deposit_count(
        &self,
        user_id: i64,
        status: Option<DepositStatus>,
    ) -> Result<i64, sqlx::Error>;

    async fn get_deposits(
        &self,
        status: Option<DepositStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DepositWithUser>, sqlx::Error>;

    async fn get_deposit_count(
        &self,
        status: Option<DepositStatus>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error>;

    /// Admin review. Verifying credits the balance and referral commissions.
    async fn review_deposit(
        &self,
        id: i64,
        status: DepositStatus,
        admin_notes: Option<String>,
    ) -> Result<Deposit, ServiceError>;
}

#[async_trait]
impl DepositExt for DBClient {
    async fn create_deposit(
        &self,
        user_id: i64,
        amount: BigDecimal,
        payment_method: PaymentMethod,
        wallet_address: String,
        transaction_hash: String,
        payment_proof_url: Option<String>,
    ) -> Result<Deposit, ServiceError> {
        let mut tx = self.pool.begin().await?;

        // A hash already used as a payment proof cannot back a deposit too
        let used_by_payment: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM images WHERE transaction_hash = ?")
                .bind(&transaction_hash)
                .fetch_one(&mut *tx)
                .await?;
        if used_by_payment > 0 {
            return Err(ServiceError::DuplicateTransactionHash);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO deposits
            (user_id, amount, payment_method, wallet_address, transaction_hash, status, payment_proof_url)
            VALUES (?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(user_id)
        .bind(&amount)
        .bind(payment_method.to_str())
        .bind(wallet_address)
        .bind(transaction_hash)
        .bind(payment_proof_url)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, ServiceError::DuplicateTransactionHash))?;

        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {} FROM deposits d WHERE d.id = ?",
            DEPOSIT_COLUMNS
        ))
        .bind(inserted.last_insert_id() as i64)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deposit)
    }

    async fn get_user_deposits(
        &self,
        user_id: i64,
        status: Option<DepositStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Deposit>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_as::<_, Deposit>(&format!(
            r#"
            SELECT {} FROM deposits d
            WHERE d.user_id = ? AND (? IS NULL OR d.status = ?)
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT ? OFFSET ?
            "#,
            DEPOSIT_COLUMNS
        ))
        .bind(user_id)
        .bind(&status)
        .bind(&status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_deposit_count(
        &self,
        user_id: i64,
        status: Option<DepositStatus>,
    ) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM deposits WHERE user_id = ? AND (? IS NULL OR status = ?)",
        )
        .bind(user_id)
        .bind(&status)
        .bind(&status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_deposits(
        &self,
        status: Option<DepositStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DepositWithUser>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());
        let pattern = like_pattern(search);

        sqlx::query_as::<_, DepositWithUser>(&format!(
            r#"
            SELECT {}, u.name AS user_name, u.email AS user_email
            FROM deposits d
            JOIN users u ON u.user_id = d.user_id
            WHERE (? IS NULL OR d.status = ?)
              AND (? IS NULL OR u.email LIKE ? OR u.name LIKE ? OR d.transaction_hash LIKE ?)
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT ? OFFSET ?
            "#,
            DEPOSIT_COLUMNS
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

    async fn get_deposit_count(
        &self,
        status: Option<DepositStatus>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());
        let pattern = like_pattern(search);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM deposits d
            JOIN users u ON u.user_id = d.user_id
            WHERE (? IS NULL OR d.status = ?)
              AND (? IS NULL OR u.email LIKE ? OR u.name LIKE ? OR d.transaction_hash LIKE ?)
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

    async fn review_deposit(
        &self,
        id: i64,
        status: DepositStatus,
        admin_notes: Option<String>,
    ) -> Result<Deposit, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let deposit = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {} FROM deposits d WHERE d.id = ? FOR UPDATE",
            DEPOSIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("Deposit", id))?;

        if !deposit.status.can_transition_to(status) {
            return Err(ServiceError::InvalidTransition {
                entity: "deposit",
                from: deposit.status.to_str().to_string(),
                to: status.to_str().to_string(),
            });
        }

        if status == DepositStatus::Verified {
            credit_with_commissions(
                &mut *tx,
                deposit.user_id,
                &deposit.amount,
                CommissionSource::Deposit,
                deposit.id,
            )
            .await?;
        }

        sqlx::query(
            "UPDATE deposits SET status = ?, admin_notes = COALESCE(?, admin_notes) WHERE id = ?",
        )
        .bind(status.to_str())
        .bind(admin_notes)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Deposit>(&format!(
            "SELECT {} FROM deposits d WHERE d.id = ?",
            DEPOSIT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "deposit {} of {} for user {} marked {}",
            updated.id,
            updated.amount,
            updated.user_id,
            updated.status.to_str()
        );
        Ok(updated)
    }
}
