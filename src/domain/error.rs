use thiserror::Error;

use super::locale::LocalizedText;

/// Violations of storefront content rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("`{field}` requires a Lao value")]
    MissingBaseLocale { field: &'static str },
    #[error("`{field}` requires an English value")]
    MissingEnglish { field: &'static str },
    #[error("invalid `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingBaseLocale { field }
            | Self::MissingEnglish { field }
            | Self::InvalidField { field, .. } => field,
        }
    }
}

/// Mandatory localized fields must carry a non-blank Lao variant.
pub fn require_base_locale(field: &'static str, text: &LocalizedText) -> Result<(), DomainError> {
    if text.lo.trim().is_empty() {
        return Err(DomainError::MissingBaseLocale { field });
    }
    Ok(())
}
