//! Outbound HTTP dispatch for webhook nodes.
//!
//! The executor builds an [`OutboundRequest`]; this layer owns the wire
//! concerns (method mapping, per-request timeout, response capture).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::AdapterError;

/// An outbound request assembled by the webhook executor.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    /// JSON payload; sent as the body for write methods, as query
    /// parameters for GET.
    pub payload: serde_json::Value,
    pub timeout_secs: u64,
}

/// What the executor needs back to classify the outcome.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

/// Single-method HTTP dispatch.
#[async_trait]
pub trait HttpDispatcher: Send + Sync {
    async fn dispatch(&self, request: &OutboundRequest) -> Result<OutboundResponse, AdapterError>;
}

/// reqwest-backed dispatcher.
pub struct ReqwestDispatcher {
    http: reqwest::Client,
}

impl ReqwestDispatcher {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl Default for ReqwestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpDispatcher for ReqwestDispatcher {
    async fn dispatch(&self, request: &OutboundRequest) -> Result<OutboundResponse, AdapterError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| AdapterError::Unsupported(format!("HTTP method '{}'", request.method)))?;

        let mut builder = self
            .http
            .request(method.clone(), &request.url)
            .timeout(Duration::from_secs(request.timeout_secs));

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let bodyless = [Method::GET, Method::HEAD, Method::OPTIONS, Method::DELETE];
        builder = if bodyless.contains(&method) {
            // Payload travels as query parameters when there is no body.
            match request.payload.as_object() {
                Some(map) if !map.is_empty() => {
                    let params: Vec<(String, String)> = map
                        .iter()
                        .map(|(k, v)| {
                            let value = match v {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            (k.clone(), value)
                        })
                        .collect();
                    builder.query(&params)
                }
                _ => builder,
            }
        } else {
            builder.json(&request.payload)
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout { seconds: request.timeout_secs }
            } else {
                AdapterError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(OutboundResponse { status, body })
    }
}
