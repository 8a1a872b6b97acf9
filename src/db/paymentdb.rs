// db/paymentdb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::{db::DBClient, referraldb::credit_with_commissions};
use crate::{
    models::{
        paymentmodel::{Payment, PaymentStatus},
        referralmodel::CommissionSource,
    },
    service::error::ServiceError,
};

const PAYMENT_COLUMNS: &str = r#"
    id, referred_id, referrer_id, image_url, transaction_hash, amount, status,
    full_name, email, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub referred_id: i64,
    pub referrer_id: Option<i64>,
    pub image_url: String,
    pub transaction_hash: String,
    pub amount: BigDecimal,
    pub hash_password: String,
    pub full_name: String,
    pub email: String,
}

#[async_trait]
pub trait PaymentExt {
    /// True when a deposit or payment already carries this hash.
    async fn is_transaction_hash_used(&self, transaction_hash: &str) -> Result<bool, sqlx::Error>;

    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, ServiceError>;

    async fn get_user_payments(&self, user_id: i64) -> Result<Vec<Payment>, sqlx::Error>;

    async fn get_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error>;

    async fn get_payment_count(&self, status: Option<PaymentStatus>) -> Result<i64, sqlx::Error>;

    /// Approval credits the submitter and pays referral commissions.
    async fn review_payment(&self, id: i64, status: PaymentStatus) -> Result<Payment, ServiceError>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn is_transaction_hash_used(&self, transaction_hash: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM deposits WHERE transaction_hash = ?)
                 + (SELECT COUNT(*) FROM images WHERE transaction_hash = ?)
            "#,
        )
        .bind(transaction_hash)
        .bind(transaction_hash)
        .fetch_one(&self.pool)
        .await
        .map(|count| count > 0)
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let used_by_deposit: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM deposits WHERE transaction_hash = ?")
                .bind(&payment.transaction_hash)
                .fetch_one(&mut *tx)
                .await?;
        if used_by_deposit > 0 {
            return Err(ServiceError::DuplicateTransactionHash);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO images
            (referred_id, referrer_id, image_url, transaction_hash, amount, status,
             hash_password, full_name, email)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(payment.referred_id)
        .bind(payment.referrer_id)
        .bind(payment.image_url)
        .bind(payment.transaction_hash)
        .bind(payment.amount)
        .bind(payment.hash_password)
        .bind(payment.full_name)
        .bind(payment.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, ServiceError::DuplicateTransactionHash))?;

        let created = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM images WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(inserted.last_insert_id() as i64)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_user_payments(&self, user_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM images WHERE referred_id = ? ORDER BY created_at DESC, id DESC",
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {} FROM images
            WHERE (? IS NULL OR status = ?)
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(&status)
        .bind(&status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_payment_count(&self, status: Option<PaymentStatus>) -> Result<i64, sqlx::Error> {
        let status = status.map(|s| s.to_str().to_string());

        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE (? IS NULL OR status = ?)")
            .bind(&status)
            .bind(&status)
            .fetch_one(&self.pool)
            .await
    }

    async fn review_payment(&self, id: i64, status: PaymentStatus) -> Result<Payment, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM images WHERE id = ? FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("Payment", id))?;

        if !payment.status.can_transition_to(status) {
            return Err(ServiceError::InvalidTransition {
                entity: "payment",
                from: payment.status.to_str().to_string(),
                to: status.to_str().to_string(),
            });
        }

        if status == PaymentStatus::Approved {
            credit_with_commissions(
                &mut *tx,
                payment.referred_id,
                &payment.amount,
                CommissionSource::Payment,
                payment.id,
            )
            .await?;
        }

        sqlx::query("UPDATE images SET status = ? WHERE id = ?")
            .bind(status.to_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM images WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "payment {} of {} for user {} marked {}",
            updated.id,
            updated.amount,
            updated.referred_id,
            updated.status.to_str()
        );
        Ok(updated)
    }
}
