pub mod depositmodel;
pub mod paymentmodel;
pub mod referralmodel;
pub mod usermodel;
pub mod withdrawalmodel;

/// Raised when a status/enum column holds a value this build does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);
