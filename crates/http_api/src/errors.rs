use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use tokio::task::JoinError;
use verdant_app::{ApiError, AppError};

/// JSON error body plus the status it is sent with.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    body: ApiError,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: Option<String>) -> Self {
        let body = ApiError {
            status: status.as_u16(),
            message: message.into(),
            code,
        };
        Self { status, body }
    }

    /// Rejection for ingest calls without the configured bearer token.
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "missing or invalid ingest token",
            Some("unauthorized".to_string()),
        )
    }

    /// A store task that panicked or was cancelled on the blocking pool.
    pub(crate) fn task_failed(err: JoinError) -> Self {
        tracing::error!(error = %err, "blocking task failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("handler task failed: {}", err),
            None,
        )
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        let api_error = ApiError::from(err);
        let status =
            StatusCode::from_u16(api_error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %api_error.message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), message = %api_error.message, "request rejected");
        }
        Self {
            status,
            body: api_error,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let unauthorized = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (self.status, Json(self.body)).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
