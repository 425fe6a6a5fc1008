use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Invalid service entry '{0}': {1}")]
    InvalidService(String, &'static str),
    #[error("Duplicate service key: {0}")]
    DuplicateService(String),
    #[error("Invalid token lifetime: {0}")]
    InvalidTokenLifetime(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("URL encoding error: {0}")]
    URLEncode(#[from] serde_urlencoded::ser::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("{0}")]
    Authentication(String),
    #[error("User not found")]
    UserNotFound,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Service not ready: {0}")]
    NotReady(String),
    #[error("Internal server error")]
    Internal,
}

impl Error {
    /// Machine-readable classification surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated => "UNAUTHENTICATED",
            Error::Forbidden => "FORBIDDEN",
            Error::Authentication(_) => "AUTHENTICATION_ERROR",
            Error::UserNotFound => "NOT_FOUND",
            Error::UserAlreadyExists => "CONFLICT",
            Error::NotReady(_) => "NOT_READY",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::UserNotFound => StatusCode::NOT_FOUND,
            Error::UserAlreadyExists => StatusCode::CONFLICT,
            Error::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Error::HTTPClient(_) => "Upstream request failed".to_owned(),
            Error::URLEncode(_) => "URL encoding error".to_owned(),
            Error::Sql(_) => "Database error".to_owned(),
            Error::Jwt(_) => "Token error".to_owned(),
            Error::NotReady(_) => "Service not ready".to_owned(),
            Error::Internal => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!("{:?}", self);
        } else {
            tracing::debug!("{:?}", self);
        }

        let body = json!({
            "error": {
                "message": self.public_message(),
                "code": self.code(),
            }
        });

        (self.status(), Json(body)).into_response()
    }
}
