use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::api_keys::ApiAuthError;
use crate::application::error::{ContentError, ErrorReport};
use crate::application::login::LoginError;
use crate::application::repos::RepoError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const EXPIRED: &str = "expired";
    pub const REVOKED: &str = "revoked";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    success: bool,
    error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
struct ApiErrorMessage {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

/// JSON error envelope. `detail` is logged but never sent to the client.
#[derive(Debug)]
pub struct ApiError {
    source: &'static str,
    status: StatusCode,
    code: &'static str,
    message: String,
    hint: Option<String>,
    detail: Option<String>,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            code,
            message: message.into(),
            hint: None,
            detail: None,
            retry_after: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn unauthorized(source: &'static str) -> Self {
        Self::new(
            source,
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "API key required",
        )
    }

    pub fn rate_limited(source: &'static str, retry_after: u64) -> Self {
        let mut error = Self::new(
            source,
            StatusCode::TOO_MANY_REQUESTS,
            codes::RATE_LIMITED,
            "Too many requests",
        )
        .with_hint(format!("Retry after {retry_after} seconds"));
        error.retry_after = Some(retry_after);
        error
    }

    pub fn from_repo(source: &'static str, err: RepoError) -> Self {
        let detail = err.to_string();
        let error = match err {
            RepoError::Duplicate { constraint } => {
                Self::new(source, StatusCode::CONFLICT, codes::DUPLICATE, "Duplicate record")
                    .with_hint(constraint)
            }
            RepoError::NotFound => Self::new(
                source,
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Resource not found",
            ),
            RepoError::InvalidInput { message } => {
                Self::new(source, StatusCode::BAD_REQUEST, codes::INVALID_INPUT, "Invalid input")
                    .with_hint(message)
            }
            RepoError::Integrity { .. } => Self::new(
                source,
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "Integrity constraint violated",
            ),
            RepoError::Timeout => Self::new(
                source,
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
            ),
            RepoError::Persistence(_) => Self::new(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Internal server error",
            ),
        };
        error.with_detail(detail)
    }

    pub fn from_content(source: &'static str, err: ContentError) -> Self {
        match err {
            ContentError::Repo(err) => Self::from_repo(source, err),
            ContentError::NotFound { resource } => Self::new(
                source,
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                format!("{} not found", capitalize(resource)),
            ),
            ContentError::Domain(err) => {
                Self::new(source, StatusCode::BAD_REQUEST, codes::VALIDATION, err.to_string())
            }
            ContentError::Slug(err) => {
                Self::new(source, StatusCode::BAD_REQUEST, codes::VALIDATION, err.to_string())
            }
        }
    }

    pub fn from_auth(source: &'static str, err: ApiAuthError) -> Self {
        match err {
            ApiAuthError::Missing | ApiAuthError::Invalid => Self::unauthorized(source),
            ApiAuthError::Expired => Self::new(
                source,
                StatusCode::UNAUTHORIZED,
                codes::EXPIRED,
                "API key expired",
            ),
            ApiAuthError::Revoked => Self::new(
                source,
                StatusCode::UNAUTHORIZED,
                codes::REVOKED,
                "API key revoked",
            ),
            ApiAuthError::MissingScope(scope) => Self::new(
                source,
                StatusCode::FORBIDDEN,
                codes::FORBIDDEN,
                "API key lacks required scope",
            )
            .with_hint(scope.as_str()),
        }
    }

    pub fn from_login(source: &'static str, err: LoginError) -> Self {
        match err {
            LoginError::RateLimited { retry_after_secs } => {
                Self::rate_limited(source, retry_after_secs)
            }
            LoginError::Auth(err) => Self::from_auth(source, err),
        }
    }

    pub fn from_json_rejection(source: &'static str, rejection: JsonRejection) -> Self {
        Self::new(
            source,
            StatusCode::BAD_REQUEST,
            codes::BAD_REQUEST,
            "Malformed request body",
        )
        .with_hint(rejection.body_text())
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| self.message.clone());
        let body = ApiErrorBody {
            success: false,
            error: ApiErrorMessage {
                code: self.code,
                message: self.message,
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(retry_after) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&retry_after.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            self.source,
            self.status,
            format!("{}: {diagnostic}", self.code),
        )
        .attach(&mut response);
        response
    }
}
