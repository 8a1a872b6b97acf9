pub mod admin;
pub mod auth;
pub mod deposits;
pub mod payments;
pub mod referrals;
pub mod users;
pub mod withdrawals;
