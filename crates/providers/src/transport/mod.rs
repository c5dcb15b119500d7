//! HTTP transport abstraction.
//!
//! The executor never talks to `reqwest` directly; it goes through
//! [`HttpTransport`] so that the host can substitute its own HTTP stack
//! and tests can count calls without a network.

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::endpoint::HttpMethod;

const USER_AGENT: &str = concat!("TradePress/", env!("CARGO_PKG_VERSION"));

/// Request handed to the transport.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Raw response: status plus undecoded body.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The request never produced a response.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends one request and returns the raw response. Performs no retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Ws => {
                return Err(TransportError::new(
                    "websocket endpoints must be opened by a streaming client",
                ))
            }
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(describe)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(describe)?;

        debug!("HTTP {} -> {} ({} bytes)", request.method, status, body.len());

        Ok(HttpResponse { status, body })
    }
}

/// Render a reqwest error without its URL, which may hold a query credential.
fn describe(error: reqwest::Error) -> TransportError {
    let timed_out = error.is_timeout();
    let connect = error.is_connect();
    let error = error.without_url();
    if timed_out {
        TransportError::new(format!("request timed out ({})", error))
    } else if connect {
        TransportError::new(format!("connection failed ({})", error))
    } else {
        TransportError::new(error.to_string())
    }
}
