/// Axum handlers for the relay
use crate::AppState;
use crate::auth::is_authorized;
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::{ErrorBody, HealthResponse, IncomingChatRequest};
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, instrument, warn};

/// Relays a chat-completion request to the upstream API.
///
/// Each step returns early with the first failure, which is rendered by `RelayError`.
#[instrument(skip_all)]
pub async fn chat_completions<T: HttpClient>(
    State(state): State<AppState<T>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match relay_chat(&state, &headers, body).await {
        Ok(upstream_body) => (StatusCode::OK, upstream_body).into_response(),
        Err(err) => {
            match &err {
                RelayError::Unauthorized => warn!("Rejected chat request with bad credentials"),
                RelayError::InvalidMessages => debug!("Rejected chat request with invalid messages"),
                RelayError::Internal(message) => error!("Chat request error: {}", message),
                // already logged with the upstream status
                RelayError::Upstream { .. } => {}
            }
            err.into_response()
        }
    }
}

async fn relay_chat<T: HttpClient>(
    state: &AppState<T>,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Bytes, RelayError> {
    if !is_authorized(state.access_token.as_ref(), headers) {
        return Err(RelayError::Unauthorized);
    }

    let body = body.map_err(|rejection| RelayError::Internal(rejection.body_text()))?;
    let upstream_request = IncomingChatRequest::from_slice(&body)?.into_upstream()?;
    info!(
        model = %upstream_request.model,
        messages = upstream_request.messages.len(),
        "Relaying chat request"
    );

    state
        .upstream
        .send(&state.http_client, &upstream_request)
        .await
}

#[instrument]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::now())
}

pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found")))
}
