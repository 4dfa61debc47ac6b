use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("db error: {0}")]
    Db(#[from] verdant_db::DbError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Message(String),
}

/// Malformed or out-of-range events are the caller's fault; IO is ours.
impl From<ingest::IngestError> for AppError {
    fn from(err: ingest::IngestError) -> Self {
        match err {
            ingest::IngestError::Io(err) => Self::Io(err),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, code) = match err {
            AppError::InvalidInput(_) => (400, Some("invalid_input".to_string())),
            AppError::NotFound(_) => (404, Some("not_found".to_string())),
            AppError::Db(_)
            | AppError::Io(_)
            | AppError::Serde(_)
            | AppError::Message(_) => (500, None),
        };
        Self {
            status,
            message: err.to_string(),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_events_map_to_client_errors() {
        let err = AppError::from(ingest::IngestError::Invalid("nodeCount must be >= 1".into()));
        let api = ApiError::from(err);
        assert_eq!(api.status, 400);
        assert_eq!(api.code.as_deref(), Some("invalid_input"));
        assert!(api.message.contains("nodeCount"));
    }

    #[test]
    fn io_failures_stay_server_errors() {
        let err = AppError::from(ingest::IngestError::Io(std::io::Error::other("disk")));
        assert_eq!(ApiError::from(err).status, 500);
    }
}
