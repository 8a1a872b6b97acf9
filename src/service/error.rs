use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} {1} not found")]
    NotFound(&'static str, i64),

    #[error("Cannot change {entity} status from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: BigDecimal,
        available: BigDecimal,
    },

    #[error("This transaction hash has already been submitted")]
    DuplicateTransactionHash,

    #[error("A user with this email already exists")]
    EmailExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    /// Turns a unique-key violation into `on_conflict`, anything else into `Database`.
    pub fn on_unique_violation(err: sqlx::Error, on_conflict: ServiceError) -> ServiceError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => on_conflict,
            _ => ServiceError::Database(err),
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(_, _) => HttpError::not_found(error.to_string()),

            ServiceError::InvalidTransition { .. }
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            ServiceError::InsufficientBalance { .. } => {
                HttpError::bad_request(ErrorMessage::InsufficientBalance.to_string())
            }

            ServiceError::DuplicateTransactionHash => HttpError::unique_constraint_violation(
                ErrorMessage::DuplicateTransactionHash.to_string(),
            ),
            ServiceError::EmailExists => {
                HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string())
            }

            ServiceError::Storage(message) => {
                tracing::error!("proof storage failed: {}", message);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            ServiceError::Database(err) => HttpError::database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn maps_to_http_status() {
        let cases = [
            (ServiceError::NotFound("Deposit", 3), StatusCode::NOT_FOUND),
            (
                ServiceError::InvalidTransition {
                    entity: "deposit",
                    from: "verified".into(),
                    to: "rejected".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::InsufficientBalance {
                    required: BigDecimal::from(20),
                    available: BigDecimal::from(5),
                },
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::DuplicateTransactionHash, StatusCode::CONFLICT),
            (ServiceError::EmailExists, StatusCode::CONFLICT),
            (ServiceError::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(HttpError::from(error).status, status);
        }
    }

    #[test]
    fn database_details_are_not_leaked() {
        let err = HttpError::from(ServiceError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.message, ErrorMessage::ServerError.to_string());
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = ServiceError::on_unique_violation(
            sqlx::Error::RowNotFound,
            ServiceError::DuplicateTransactionHash,
        );
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
