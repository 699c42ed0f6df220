use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    // Сетевые ошибки
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Ответ сервера вне диапазона 2xx
    #[error("HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },

    // Бизнес-логика ошибки
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Ошибки сериализации/десериализации
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Ошибки конфигурации
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContentError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ContentError::Api { status, .. } => Some(*status),
            ContentError::Http(err) => err.status(),
            ContentError::Conflict(_) => Some(StatusCode::CONFLICT),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Serialization(err.to_string())
    }
}
