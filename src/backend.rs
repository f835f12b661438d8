use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Body posted to the chat backend
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    input: &'a str,
}

/// Decoded backend answer. `output` is `None` unless the body carried a
/// string `output` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub output: Option<String>,
}

impl ChatReply {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
        }
    }

    /// Decode a response body. Any JSON is accepted; only a string `output`
    /// field is picked up.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let output = value
            .get("output")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        Ok(Self { output })
    }
}

/// Everything that can go wrong talking to the backend. The conversation
/// treats all variants the same; they only differ in the log.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered with status {0}")]
    Status(StatusCode),
    #[error("response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote collaborator answering one prompt per call
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, input: &str) -> Result<ChatReply, RequestFailure>;
}

/// reqwest client for the JSON chat endpoint
#[derive(Clone)]
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, input: &str) -> Result<ChatReply, RequestFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&ChatRequest { input })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "chat backend rejected request");
            return Err(RequestFailure::Status(status));
        }

        let body = response.bytes().await?;
        Ok(ChatReply::from_body(&body)?)
    }
}
