//! HTTP transport for the push endpoint

use reqwest::StatusCode;
use serde::Deserialize;

use super::{PushBatch, PushResponse, SyncTransport, TransportError};
use crate::config::SyncConfig;

/// Pushes batches to a remote HTTP endpoint as JSON, with optional bearer
/// auth. The server's merge algorithm is its own business; this client only
/// relays batches and verdicts.
#[derive(Clone)]
pub struct HttpSyncTransport {
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            TransportError::InvalidConfiguration("push endpoint is not set".to_string())
        })?;
        let endpoint = normalize_endpoint(endpoint)?;
        Ok(Self {
            endpoint,
            auth_token: config.auth_token.clone(),
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl SyncTransport for HttpSyncTransport {
    async fn push(&self, batch: &PushBatch) -> Result<PushResponse, TransportError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .header("Accept", "application/json");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(parse_api_error(status, &body)));
        }

        response
            .json::<PushResponse>()
            .await
            .map_err(|e| TransportError::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> Result<String, TransportError> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err(TransportError::InvalidConfiguration(
            "endpoint must not be empty".to_string(),
        ));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidConfiguration(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}
