// db/db.rs
use sqlx::{MySql, Pool};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<MySql>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<MySql>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<MySql>) -> Self {
        DBClient { pool }
    }
}

/// True when `err` is a duplicate-key error on the named unique index.
pub(crate) fn is_unique_violation_on(err: &sqlx::Error, key: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains(key)
        }
        _ => false,
    }
}

/// `%term%` for LIKE filters, or None when no search was given.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(Some("bob")), Some("%bob%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation_on(&sqlx::Error::RowNotFound, "uq_users_email"));
    }
}
