use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse secrets file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Remote { .. } | Error::Http(_) | Error::Json(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Validation("empty question".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(Error::NotFound("poll".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Remote {
                status: 401,
                body: "unauthorized".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(Error::Config("missing token".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Error::Unavailable("lock poisoned".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
