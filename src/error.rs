use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// An external OCR or LLM call failed (network, quota, deadline, bad status).
    Transport(String),
    BadRequest(String),
    Config(String),
    HintsExhausted,
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(msg) => write!(f, "Upstream service error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::HintsExhausted => write!(f, "No more hints available for this problem"),
            AppError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() });
        match self {
            AppError::Transport(_) => HttpResponse::BadGateway().json(body),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(body),
            AppError::HintsExhausted => HttpResponse::Conflict().json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(
            AppError::Transport("timeout".into()).error_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::BadRequest("empty".into()).error_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::HintsExhausted.error_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Config("no key".into()).error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
