pub mod error;
pub mod ledger;
pub mod referral;
pub mod storage;
