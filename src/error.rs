use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("{0}")]
    Validation(String),
    #[error("failed to load messages: {0}")]
    Fetch(String),
    #[error("{0}")]
    Mutation(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Auth(_) => "auth",
            AppError::Api(_) | AppError::Http(_) => "api",
            AppError::Validation(_) | AppError::InvalidInput(_) => "validation",
            AppError::Fetch(_) => "fetch",
            AppError::Mutation(_) => "mutation",
            AppError::Device(_) => "device",
            AppError::Io(_) | AppError::Json(_) | AppError::Url(_) => "internal",
        }
    }

    /// Human-readable reason used when an error is folded into a fetch or
    /// mutation failure.
    pub fn reason(&self) -> String {
        match self {
            AppError::Api(message)
            | AppError::Fetch(message)
            | AppError::Mutation(message)
            | AppError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
