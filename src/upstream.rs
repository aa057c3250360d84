/// The upstream chat-completions API and how requests are forwarded to it.
///
/// The upstream is fixed at start-up: a single URL plus the server-held API key that is
/// injected into every forwarded request. Callers never see the key.
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        Method, StatusCode, Uri,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use bon::Builder;
use serde::de::IgnoredAny;
use tracing::{debug, error};
use url::Url;

use crate::{
    client::HttpClient,
    errors::RelayError,
    models::{UpstreamChatRequest, upstream_error_details},
};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone, Builder)]
pub struct Upstream {
    /// Full URL of the chat-completions endpoint.
    pub url: Url,
    /// Sent as `Authorization: Bearer {api_key}`. Without it no Authorization header is sent
    /// and the upstream rejects the call.
    pub api_key: Option<String>,
    /// Upper bound on the call including reading the response body.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Upstream {
    /// Builds the outbound POST carrying the chat request as JSON.
    pub fn build_request(&self, chat: &UpstreamChatRequest) -> Result<Request, RelayError> {
        let body = serde_json::to_vec(chat).map_err(RelayError::internal)?;
        let uri = Uri::try_from(self.url.as_str()).map_err(RelayError::internal)?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");

        if let Some(key) = &self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        } else {
            debug!("No API key configured for upstream {}", self.url);
        }

        builder.body(Body::from(body)).map_err(RelayError::internal)
    }

    /// Sends a chat request upstream and returns the success body untouched.
    ///
    /// A non-success status becomes `RelayError::Upstream` with the upstream's own status code.
    /// A success body that is not valid JSON is an internal error.
    pub async fn send<T: HttpClient + ?Sized>(
        &self,
        client: &T,
        chat: &UpstreamChatRequest,
    ) -> Result<Bytes, RelayError> {
        let req = self.build_request(chat)?;

        let exchange = async {
            let response = client.request(req).await.map_err(|e| {
                error!("Error forwarding request to upstream {}: {}", self.url, e);
                RelayError::internal(e)
            })?;
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .map_err(RelayError::internal)?;
            Ok::<(StatusCode, Bytes), RelayError>((status, body))
        };

        let (status, body) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                error!("Upstream {} did not answer within {:?}", self.url, limit);
                RelayError::Internal(format!("upstream request timed out after {limit:?}"))
            })??,
            None => exchange.await?,
        };

        if !status.is_success() {
            let details = upstream_error_details(&body);
            error!(status = status.as_u16(), details = %details, "OpenAI API error");
            return Err(RelayError::Upstream { status, details });
        }

        serde_json::from_slice::<IgnoredAny>(&body).map_err(RelayError::internal)?;
        debug!("Upstream answered {} with {} bytes", status, body.len());
        Ok(body)
    }
}
