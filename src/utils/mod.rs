pub mod currency;
pub mod password;
pub mod token;
pub mod wallet_address;
