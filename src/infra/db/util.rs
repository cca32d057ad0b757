use crate::application::repos::RepoError;
use crate::domain::locale::{LocalizedList, LocalizedText};

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.message().contains("duplicate key") => {
            RepoError::Duplicate {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db.message().contains("violates foreign key constraint")
                || db.message().contains("invalid input syntax") =>
        {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db) if db.message().contains("violates") => RepoError::Integrity {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

/// Assemble per-locale columns; NULL optional variants read as empty.
pub(super) fn localized_text(
    lo: String,
    th: Option<String>,
    zh: Option<String>,
    en: Option<String>,
) -> LocalizedText {
    LocalizedText {
        lo,
        th: th.unwrap_or_default(),
        zh: zh.unwrap_or_default(),
        en: en.unwrap_or_default(),
    }
}

pub(super) fn localized_list(
    lo: Vec<String>,
    th: Option<Vec<String>>,
    zh: Option<Vec<String>>,
    en: Option<Vec<String>>,
) -> LocalizedList {
    LocalizedList {
        lo,
        th: th.unwrap_or_default(),
        zh: zh.unwrap_or_default(),
        en: en.unwrap_or_default(),
    }
}

/// Blank optional variants are stored as NULL.
pub(super) fn nullable(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

pub(super) fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}
