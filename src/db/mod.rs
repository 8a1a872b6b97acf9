pub mod admindb;
pub mod db;
pub mod depositdb;
pub mod paymentdb;
pub mod referraldb;
pub mod userdb;
pub mod withdrawaldb;

pub use db::DBClient;
