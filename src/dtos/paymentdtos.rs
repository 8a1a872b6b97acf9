use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::paymentmodel::{Payment, PaymentStatus},
    utils::currency::usdt_to_f64,
};

/// Text fields of the multipart payment form, collected before validation.
#[derive(Debug, Default, Clone, Validate)]
pub struct PaymentFormDto {
    #[validate(length(min = 1, max = 128, message = "Transaction hash is required"))]
    pub transaction_hash: String,

    #[validate(length(min = 1, message = "Amount is required"))]
    pub amount: String,

    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub hash_password: String,
}

impl PaymentFormDto {
    /// Stores a text field by its form name; unknown fields are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "transaction_hash" | "transactionHash" => self.transaction_hash = value.trim().to_string(),
            "amount" => self.amount = value.trim().to_string(),
            "full_name" | "fullName" => self.full_name = value.trim().to_string(),
            "email" => self.email = value.trim().to_lowercase(),
            "hash_password" | "hashPassword" | "password" => self.hash_password = value,
            _ => {}
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewPaymentDto {
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentDto {
    pub id: i64,
    pub referred_id: i64,
    pub referrer_id: Option<i64>,
    pub image_url: String,
    pub transaction_hash: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        PaymentDto {
            id: p.id,
            referred_id: p.referred_id,
            referrer_id: p.referrer_id,
            image_url: p.image_url,
            transaction_hash: p.transaction_hash,
            amount: usdt_to_f64(&p.amount),
            status: p.status,
            full_name: p.full_name,
            email: p.email,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_form_fields_by_either_spelling() {
        let mut form = PaymentFormDto::default();
        form.set_field("transactionHash", " abc ".to_string());
        form.set_field("amount", "75".to_string());
        form.set_field("full_name", "Ada Lovelace".to_string());
        form.set_field("email", "ADA@Example.com".to_string());
        form.set_field("hash_password", "secret123".to_string());
        form.set_field("unexpected", "ignored".to_string());

        assert_eq!(form.transaction_hash, "abc");
        assert_eq!(form.email, "ada@example.com");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn missing_fields_fail_validation() {
        assert!(PaymentFormDto::default().validate().is_err());
    }
}
