use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    db::userdb::UserDashboard,
    models::usermodel::User,
    utils::currency::usdt_to_f64,
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignupUserDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct UserPasswordUpdateDto {
    #[validate(
        length(min = 1, message = "New password is required."),
        length(min = 6, message = "new password must be at least 6 characters")
    )]
    pub new_password: String,

    #[validate(
        length(min = 1, message = "New password confirm is required."),
        must_match(other = "new_password", message = "new passwords do not match")
    )]
    pub new_password_confirm: String,

    #[validate(length(min = 1, message = "Old password is required."))]
    pub old_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub account_balance: f64,
    pub total_earning: f64,
    pub rewards: f64,
    pub referral_code: Option<String>,
    pub referred_by: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            user_id: user.user_id,
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            is_admin: user.is_admin(),
            account_balance: usdt_to_f64(&user.account_balance),
            total_earning: usdt_to_f64(&user.total_earning),
            rewards: usdt_to_f64(&user.rewards),
            referral_code: user.referral_code.clone(),
            referred_by: user.referred_by,
            created_at: user.created_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub success: bool,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardDto {
    pub account_balance: f64,
    pub total_earning: f64,
    pub rewards: f64,
    pub total_deposited: f64,
    pub total_withdrawn: f64,
    pub pending_deposits: i64,
    pub pending_withdrawals: i64,
    pub level1_referrals: i64,
    pub level2_referrals: i64,
}

impl From<UserDashboard> for DashboardDto {
    fn from(d: UserDashboard) -> Self {
        DashboardDto {
            account_balance: usdt_to_f64(&d.account_balance),
            total_earning: usdt_to_f64(&d.total_earning),
            rewards: usdt_to_f64(&d.rewards),
            total_deposited: usdt_to_f64(&d.total_deposited),
            total_withdrawn: usdt_to_f64(&d.total_withdrawn),
            pending_deposits: d.pending_deposits,
            pending_withdrawals: d.pending_withdrawals,
            level1_referrals: d.level1_count,
            level2_referrals: d.level2_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignupUserDto {
        SignupUserDto {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret123".to_string(),
            password_confirm: "secret123".to_string(),
            referral_code: None,
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn signup_rejects_mismatched_passwords() {
        let body = SignupUserDto {
            password_confirm: "secret124".to_string(),
            ..signup()
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn signup_rejects_bad_email_and_short_password() {
        let body = SignupUserDto {
            email: "not-an-email".to_string(),
            ..signup()
        };
        assert!(body.validate().is_err());

        let body = SignupUserDto {
            password: "abc".to_string(),
            password_confirm: "abc".to_string(),
            ..signup()
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn signup_reads_camel_case_confirmation() {
        let body: SignupUserDto = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","password":"secret123","passwordConfirm":"secret123","referral_code":"AB12CD34"}"#,
        )
        .unwrap();
        assert_eq!(body.password_confirm, "secret123");
        assert_eq!(body.referral_code.as_deref(), Some("AB12CD34"));
    }
}
