use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{errors::HttpError, state::HttpState};

pub async fn require_ingest_token(
    State(state): State<HttpState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HttpError> {
    let Some(expected) = state.ingest_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    if presented != Some(expected) {
        tracing::warn!(path = %req.uri().path(), "ingest request rejected: bad bearer token");
        return Err(HttpError::unauthorized());
    }

    Ok(next.run(req).await)
}
